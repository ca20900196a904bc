/// Integration tests for the threaded channel transport
/// The fabric side runs on its own thread; the worker drains it each tick.

use std::thread;

use spindle_shared::{OutboundMessage, Payload, StatusCode, WorkerOp};
use spindle_test::{ms, ops::*, TestEntity, TestWorld};
use spindle_worker::{
    transport::{ChannelTransport, TransportError},
    SpindleWorkerError, Worker, WorkerConfig,
};

fn config() -> WorkerConfig {
    WorkerConfig {
        entity_pool_size: 0,
        ..WorkerConfig::default()
    }
}

#[test]
fn ops_from_a_background_thread_are_applied() {
    let (transport, endpoint) = ChannelTransport::unbounded();
    let mut worker: Worker<TestEntity, ChannelTransport> = Worker::new(config(), transport);
    let mut world = TestWorld::new();

    let fabric = endpoint.clone();
    thread::spawn(move || {
        fabric.send_ops(vec![add_entity(1), add_component(1, 2, vec![field(1, b"a")])])?;
        fabric.send_ops(vec![command_request(5, 1, 2, 0, Payload::from_bytes(vec![9]))])
    })
    .join()
    .unwrap()
    .unwrap();

    worker.receive_ops(&mut world, ms(0)).unwrap();

    let object = worker.receiver().cache().entity_root(&entity(1)).unwrap();
    assert_eq!(world.field(&object, 2, 1).unwrap().bytes, b"a".to_vec());
    assert_eq!(
        endpoint.drain_messages(),
        vec![(
            0,
            OutboundMessage::CommandResponse {
                request_id: 5,
                status: StatusCode::Success,
                payload: Payload::from_bytes(vec![9]),
            }
        )]
    );
}

#[test]
fn fabric_log_messages_are_consumed() {
    let (transport, endpoint) = ChannelTransport::unbounded();
    let mut worker: Worker<TestEntity, ChannelTransport> = Worker::new(config(), transport);
    let mut world = TestWorld::new();

    endpoint
        .send_ops(vec![WorkerOp::LogMessage {
            level: spindle_shared::LogLevel::Warn,
            message: "load shedding".to_string(),
        }])
        .unwrap();
    worker.receive_ops(&mut world, ms(0)).unwrap();

    assert!(worker.take_events().is_empty());
    assert!(endpoint.try_recv_message().is_none());
    assert_eq!(
        log::Level::from(spindle_shared::LogLevel::Warn),
        log::Level::Warn
    );
}

#[test]
fn dropped_fabric_disconnects_the_worker() {
    let (transport, endpoint) = ChannelTransport::unbounded();
    let mut worker: Worker<TestEntity, ChannelTransport> = Worker::new(config(), transport);
    let mut world = TestWorld::new();
    drop(endpoint);

    assert_eq!(
        worker.receive_ops(&mut world, ms(0)),
        Err(SpindleWorkerError::Transport(TransportError::Disconnected))
    );
}
