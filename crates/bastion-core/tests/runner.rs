//! Integration tests for the async decision loop.

#![allow(clippy::unwrap_used)]

mod common;

use std::time::Duration;

use tokio::sync::mpsc;

use bastion_core::{
    ChannelDecisionSource, Decision, MoveDelegate, RunnerError, ScriptedDecisionSource,
    StubDecisionSource, drive,
};
use bastion_types::{MovePhase, UnitKind};

use common::{HARMLESS_AA, World, order};

#[tokio::test]
async fn scripted_answer_completes_the_raid() {
    let mut world = World::new();
    let bomber = world.spawn(world.red, UnitKind::Bomber, world.home);
    let mut delegate = MoveDelegate::new(HARMLESS_AA, 5);
    delegate
        .start(world.red, MovePhase::Combat, &mut world.game)
        .unwrap();

    let outcome = delegate
        .move_units(&mut world.game, order(&[bomber], world.home, &[world.works]))
        .unwrap();
    let mut source = ScriptedDecisionSource::new([Decision::Bomb(true)]);
    drive(
        &mut delegate,
        &mut world.game,
        outcome,
        &mut source,
        Duration::from_secs(1),
    )
    .await
    .unwrap();

    assert!(!delegate.is_suspended());
    assert_eq!(source.remaining(), 0);
    let raid = world.game.battles.battles_in(world.works).next().unwrap();
    assert!(raid.bombing_raid);
}

#[tokio::test]
async fn stub_source_declines_the_raid() {
    let mut world = World::new();
    let bomber = world.spawn(world.red, UnitKind::Bomber, world.home);
    let mut delegate = MoveDelegate::new(HARMLESS_AA, 5);
    delegate
        .start(world.red, MovePhase::Combat, &mut world.game)
        .unwrap();

    let outcome = delegate
        .move_units(&mut world.game, order(&[bomber], world.home, &[world.works]))
        .unwrap();
    drive(
        &mut delegate,
        &mut world.game,
        outcome,
        &mut StubDecisionSource::new(),
        Duration::from_secs(1),
    )
    .await
    .unwrap();

    let battle = world.game.battles.battles_in(world.works).next().unwrap();
    assert!(!battle.bombing_raid);
    assert_eq!(delegate.ledger().len(), 1);
}

#[tokio::test]
async fn idle_outcome_needs_no_decision() {
    let mut world = World::new();
    let tank = world.spawn(world.red, UnitKind::Armour, world.home);
    let mut delegate = MoveDelegate::new(HARMLESS_AA, 5);
    delegate
        .start(world.red, MovePhase::Combat, &mut world.game)
        .unwrap();

    let outcome = delegate
        .move_units(&mut world.game, order(&[tank], world.home, &[world.plains]))
        .unwrap();
    let mut source = ScriptedDecisionSource::new(Vec::new());
    drive(
        &mut delegate,
        &mut world.game,
        outcome,
        &mut source,
        Duration::from_secs(1),
    )
    .await
    .unwrap();
    assert_eq!(delegate.ledger().len(), 1);
}

#[tokio::test]
async fn silent_participant_times_out_and_move_stays_suspended() {
    let mut world = World::new();
    let bomber = world.spawn(world.red, UnitKind::Bomber, world.home);
    let mut delegate = MoveDelegate::new(HARMLESS_AA, 5);
    delegate
        .start(world.red, MovePhase::Combat, &mut world.game)
        .unwrap();

    let outcome = delegate
        .move_units(&mut world.game, order(&[bomber], world.home, &[world.works]))
        .unwrap();
    let (request_tx, mut request_rx) = mpsc::channel(1);
    let (_answer_tx, answer_rx) = mpsc::channel::<Decision>(1);
    let mut source = ChannelDecisionSource::new(request_tx, answer_rx);

    let err = drive(
        &mut delegate,
        &mut world.game,
        outcome,
        &mut source,
        Duration::from_millis(20),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RunnerError::Timeout { .. }));
    assert!(request_rx.recv().await.is_some());
    assert!(delegate.is_suspended());
    assert!(delegate.ledger().is_empty());
}
