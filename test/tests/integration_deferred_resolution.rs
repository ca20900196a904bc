/// Integration tests for deferred reference resolution
/// Fields and commands referencing objects that are not known yet are
/// replayed once those objects become known.

use spindle_shared::{GlobalRef, ObjectEvent, OutboundMessage, Payload, StatusCode};
use spindle_test::{assert_sent, ms, ops::*, test_worker, tick, TestWorld};
use spindle_worker::WorkerEvent;

#[test]
fn field_referencing_a_later_entity_is_reapplied() {
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();

    fabric.push_ops(vec![
        add_entity(1),
        add_component(
            1,
            5,
            vec![field_with_refs(2, b"target", vec![GlobalRef::entity(entity(2))])],
        ),
    ]);
    tick(&mut worker, &mut world, ms(0)).unwrap();

    let first = worker.receiver().cache().entity_root(&entity(1)).unwrap();
    assert_eq!(world.field(&first, 5, 2).unwrap().objects, vec![None]);
    assert_eq!(worker.receiver().resolver().pending_field_count(), 1);

    fabric.push_ops(vec![add_entity(2)]);
    tick(&mut worker, &mut world, ms(10)).unwrap();

    let second = worker.receiver().cache().entity_root(&entity(2)).unwrap();
    assert_eq!(world.field(&first, 5, 2).unwrap().objects, vec![Some(second)]);
    assert_eq!(worker.receiver().resolver().pending_field_count(), 0);
    assert!(worker.take_events().contains(&WorkerEvent::Object(
        ObjectEvent::FieldResolved {
            object: first,
            component_id: 5,
            field_id: 2,
        }
    )));
}

#[test]
fn command_waits_for_its_argument_then_responds() {
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();

    fabric.push_ops(vec![
        add_entity(1),
        command_request(
            40,
            1,
            3,
            0,
            Payload::new(b"hit".to_vec(), vec![GlobalRef::entity(entity(2))]),
        ),
    ]);
    tick(&mut worker, &mut world, ms(0)).unwrap();

    assert!(world.commands.is_empty());
    assert!(fabric.take_sent().is_empty());

    fabric.push_ops(vec![add_entity(2)]);
    tick(&mut worker, &mut world, ms(10)).unwrap();

    let target = worker.receiver().cache().entity_root(&entity(1)).unwrap();
    let argument = worker.receiver().cache().entity_root(&entity(2)).unwrap();
    assert_eq!(world.commands.len(), 1);
    assert_eq!(world.commands[0].target, target);
    assert_eq!(world.commands[0].objects, vec![Some(argument)]);

    let sent = fabric.take_sent();
    assert_sent!(
        sent,
        OutboundMessage::CommandResponse {
            request_id: 40,
            status: StatusCode::Success,
            ..
        }
    );
}

#[test]
fn static_object_reference_is_loaded_on_demand() {
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();
    let level = world.spawn_static(None, "Level");
    let door = world.spawn_static(Some(level), "Door");

    let door_ref = GlobalRef::path("Door", Some(GlobalRef::path("Level", None)));
    fabric.push_ops(vec![
        add_entity(1),
        add_component(1, 5, vec![field_with_refs(1, b"door", vec![door_ref])]),
    ]);
    tick(&mut worker, &mut world, ms(0)).unwrap();

    let object = worker.receiver().cache().entity_root(&entity(1)).unwrap();
    assert_eq!(world.field(&object, 5, 1).unwrap().objects, vec![Some(door)]);
    assert!(worker.local_id_of(&door).is_some());
}

#[test]
fn locally_created_entity_releases_waiting_fields() {
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();
    let local = world.spawn("Projectile");

    let request_id = worker.create_entity(local, vec![]).unwrap();
    fabric.push_ops(vec![
        add_entity(1),
        add_component(
            1,
            5,
            vec![field_with_refs(1, b"shot", vec![GlobalRef::entity(entity(50))])],
        ),
    ]);
    tick(&mut worker, &mut world, ms(0)).unwrap();

    let holder = worker.receiver().cache().entity_root(&entity(1)).unwrap();
    assert_eq!(world.field(&holder, 5, 1).unwrap().objects, vec![None]);

    fabric.push_ops(vec![create_entity_response(request_id, 50)]);
    tick(&mut worker, &mut world, ms(10)).unwrap();

    assert_eq!(world.field(&holder, 5, 1).unwrap().objects, vec![Some(local)]);
    assert!(worker.take_events().contains(&WorkerEvent::EntityCreated {
        object: local,
        entity_id: entity(50),
    }));
}

#[test]
fn command_for_unknown_entity_gets_not_found() {
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();

    fabric.push_ops(vec![command_request(8, 77, 1, 0, Payload::default())]);
    tick(&mut worker, &mut world, ms(0)).unwrap();

    let sent = fabric.take_sent();
    assert_sent!(
        sent,
        OutboundMessage::CommandResponse {
            request_id: 8,
            status: StatusCode::NotFound,
            ..
        }
    );
}
