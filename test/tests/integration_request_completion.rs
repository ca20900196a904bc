/// Integration tests for asynchronous request completions
/// Completions resume the request that issued them, unless the object that
/// owns the request was destroyed in the meantime.

use spindle_shared::{EntityQuery, OutboundMessage, Payload, StatusCode, WorkerOp};
use spindle_test::{assert_sent, ms, ops::*, test_worker, tick, LocalTransport, TestWorld};
use spindle_worker::{
    transport::TransportError, SpindleWorkerError, Worker, WorkerConfig, WorkerEvent,
};

#[test]
fn create_entity_binds_the_object() {
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();
    let object = world.spawn("Crate");

    let request_id = worker.create_entity(object, vec![]).unwrap();
    assert_sent!(fabric.take_sent(), OutboundMessage::CreateEntity { entity_id: None, .. });

    fabric.push_ops(vec![create_entity_response(request_id, 12)]);
    tick(&mut worker, &mut world, ms(0)).unwrap();

    assert_eq!(worker.receiver().cache().entity_root(&entity(12)), Some(object));
    assert_eq!(
        worker.take_events(),
        vec![WorkerEvent::EntityCreated {
            object,
            entity_id: entity(12),
        }]
    );
}

#[test]
fn completion_for_destroyed_object_is_ignored() {
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();
    let object = world.spawn("Crate");

    let request_id = worker.create_entity(object, vec![]).unwrap();
    world.despawn(&object);
    worker.on_object_destroyed(&object);

    fabric.push_ops(vec![create_entity_response(request_id, 12)]);
    tick(&mut worker, &mut world, ms(0)).unwrap();

    assert!(worker.take_events().is_empty());
    assert!(!worker.receiver().cache().has_entity(&entity(12)));
    assert_eq!(worker.pending_request_count(), 0);
}

#[test]
fn failed_create_is_reported() {
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();
    let object = world.spawn("Crate");

    let request_id = worker.create_entity(object, vec![]).unwrap();
    fabric.push_ops(vec![WorkerOp::CreateEntityResponse {
        request_id,
        status: StatusCode::PermissionDenied,
        entity_id: None,
        message: "denied".to_string(),
    }]);
    tick(&mut worker, &mut world, ms(0)).unwrap();

    assert_eq!(
        worker.take_events(),
        vec![WorkerEvent::CreateEntityFailed {
            object,
            status: StatusCode::PermissionDenied,
            message: "denied".to_string(),
        }]
    );
    assert!(worker.local_id_of(&object).is_none());
}

#[test]
fn query_response_is_delivered() {
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();

    let request_id = worker.query(EntityQuery::Component(4)).unwrap();
    fabric.push_ops(vec![WorkerOp::EntityQueryResponse {
        request_id,
        status: StatusCode::Success,
        entities: vec![entity(1), entity(2)],
        message: String::new(),
    }]);
    tick(&mut worker, &mut world, ms(0)).unwrap();

    assert_eq!(
        worker.take_events(),
        vec![WorkerEvent::QueryResponse {
            request_id,
            status: StatusCode::Success,
            entities: vec![entity(1), entity(2)],
        }]
    );
}

#[test]
fn unknown_completion_is_skipped() {
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();

    fabric.push_ops(vec![create_entity_response(999, 3)]);
    tick(&mut worker, &mut world, ms(0)).unwrap();

    assert!(worker.take_events().is_empty());
    assert!(!worker.receiver().cache().has_entity(&entity(3)));
}

#[test]
fn reserved_entity_ids_are_used_for_creation() {
    let config = WorkerConfig {
        entity_pool_size: 10,
        entity_pool_refill_threshold: 5,
        ..WorkerConfig::default()
    };
    let (transport, fabric) = LocalTransport::new();
    let mut worker = Worker::new(config, transport);
    let mut world = TestWorld::new();

    tick(&mut worker, &mut world, ms(0)).unwrap();
    let reservation = fabric
        .take_sent()
        .into_iter()
        .find_map(|(_, message)| match message {
            OutboundMessage::ReserveEntityIds { request_id, count } => Some((request_id, count)),
            _ => None,
        })
        .unwrap();
    assert_eq!(reservation.1, 10);

    fabric.push_ops(vec![reserve_response(reservation.0, 500, 10)]);
    tick(&mut worker, &mut world, ms(10)).unwrap();
    assert_eq!(worker.entity_pool_len(), 10);

    let object = world.spawn("Crate");
    worker.create_entity(object, vec![]).unwrap();
    assert_sent!(
        fabric.take_sent(),
        OutboundMessage::CreateEntity {
            entity_id: Some(_),
            ..
        }
    );
    assert_eq!(worker.entity_pool_len(), 9);
}

#[test]
fn refused_requests_leave_nothing_pending() {
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();
    let object = world.spawn("Unsent");
    fabric.disconnect();

    let disconnected = SpindleWorkerError::Transport(TransportError::Disconnected);
    assert_eq!(worker.create_entity(object, vec![]), Err(disconnected.clone()));
    assert_eq!(worker.query(EntityQuery::Component(4)), Err(disconnected.clone()));
    assert_eq!(
        worker.send_command(entity(1), 2, 3, Payload::default()),
        Err(disconnected)
    );
    assert_eq!(worker.pending_request_count(), 0);
}
