/// Integration tests for critical-section batching
/// Lifecycle ops buffered inside a critical section are applied in phases
/// when it closes, whatever order they arrived in.

use spindle_shared::{Authority, ObjectEvent, WorkerOp};
use spindle_test::{ms, ops::*, test_worker, tick, TestWorld};
use spindle_worker::WorkerEvent;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn event_names(events: &[WorkerEvent<spindle_test::TestEntity>]) -> Vec<&'static str> {
    events
        .iter()
        .map(|event| match event {
            WorkerEvent::Object(ObjectEvent::Spawned { .. }) => "spawned",
            WorkerEvent::Object(ObjectEvent::Despawned { .. }) => "despawned",
            WorkerEvent::Object(ObjectEvent::ComponentAdded { .. }) => "added",
            WorkerEvent::Object(ObjectEvent::ComponentUpdated { .. }) => "updated",
            WorkerEvent::Object(ObjectEvent::AuthorityChanged { .. }) => "authority",
            _ => "other",
        })
        .collect()
}

#[test]
fn critical_section_applies_ops_in_phases() {
    init_logger();
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();

    fabric.push_ops(vec![
        WorkerOp::CriticalSection(true),
        update_component(7, 3, vec![field(1, b"late")]),
        authority(7, 3, Authority::Authoritative),
        add_component(7, 3, vec![field(1, b"initial")]),
        add_entity(7),
        WorkerOp::CriticalSection(false),
    ]);
    tick(&mut worker, &mut world, ms(0)).unwrap();

    assert_eq!(
        event_names(&worker.take_events()),
        vec!["spawned", "added", "authority", "updated"]
    );

    let object = worker.receiver().cache().entity_root(&entity(7)).unwrap();
    assert_eq!(world.field(&object, 3, 1).unwrap().bytes, b"late".to_vec());
    assert!(worker.receiver().has_authority(&entity(7), 3));
    assert_eq!(
        world.authority_changes,
        vec![(object, 3, Authority::Authoritative)]
    );
}

#[test]
fn ops_are_held_until_the_section_closes() {
    init_logger();
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();

    fabric.push_ops(vec![WorkerOp::CriticalSection(true), add_entity(1)]);
    tick(&mut worker, &mut world, ms(0)).unwrap();

    assert!(worker.receiver().is_in_critical_section());
    assert!(worker.take_events().is_empty());
    assert_eq!(world.object_count(), 0);

    fabric.push_ops(vec![add_component(1, 2, vec![]), WorkerOp::CriticalSection(false)]);
    tick(&mut worker, &mut world, ms(10)).unwrap();

    assert!(!worker.receiver().is_in_critical_section());
    assert_eq!(event_names(&worker.take_events()), vec!["spawned", "added"]);
    let object = worker.receiver().cache().entity_root(&entity(1)).unwrap();
    assert!(world.has_component(&object, 2));
}

#[test]
fn removals_in_a_section_run_before_additions() {
    init_logger();
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();

    fabric.push_ops(vec![add_entity(4)]);
    tick(&mut worker, &mut world, ms(0)).unwrap();
    worker.take_events();

    // the entity is re-added with fresh state in the same section
    fabric.push_ops(vec![
        WorkerOp::CriticalSection(true),
        add_entity(4),
        remove_entity(4),
        WorkerOp::CriticalSection(false),
    ]);
    tick(&mut worker, &mut world, ms(10)).unwrap();

    assert_eq!(
        event_names(&worker.take_events()),
        vec!["despawned", "spawned"]
    );
    assert!(worker.receiver().cache().has_entity(&entity(4)));
    assert_eq!(world.object_count(), 1);
}

#[test]
fn out_of_order_ops_outside_a_section_are_skipped() {
    init_logger();
    let (mut worker, fabric) = test_worker();
    let mut world = TestWorld::new();

    fabric.push_ops(vec![add_component(9, 1, vec![]), add_entity(9)]);
    tick(&mut worker, &mut world, ms(0)).unwrap();

    assert_eq!(event_names(&worker.take_events()), vec!["spawned"]);
    let object = worker.receiver().cache().entity_root(&entity(9)).unwrap();
    assert!(!world.has_component(&object, 1));
}
