use std::time::Duration;

use tactics_core::{
    ActorId, Archetype, MatchResult, MatchSetup, MatchState, Notification, Point, TeamId,
};
use tactics_runtime::{
    Event, ObserverClient, ObserverReplica, Runtime, RuntimeConfig, SkirmishProvider, TickMode,
};

const TICK: f32 = 0.1;

/// Two on each side, far enough apart that nobody starts in range.
fn skirmish() -> MatchSetup {
    let mut setup = MatchSetup::new();
    setup.spawn(TeamId::Zero, Archetype::Standard, Point::ground(0.0, 0.0)).unwrap();
    setup.spawn(TeamId::Zero, Archetype::LongRange, Point::ground(0.0, 3.0)).unwrap();
    setup.spawn(TeamId::One, Archetype::Standard, Point::ground(6.0, 0.0)).unwrap();
    setup.spawn(TeamId::One, Archetype::ShortRange, Point::ground(6.0, 3.0)).unwrap();
    setup
}

fn assert_converged(replica: &ObserverReplica, state: &MatchState) {
    assert_eq!(replica.active_team(), Some(state.turn.active_team));
    assert_eq!(replica.active_actor_id(), state.turn.active_actor);
    assert_eq!(replica.phase(), state.turn.phase);
    for actor in state.actors.values() {
        let view = replica.actor(actor.id).expect("replica knows every actor");
        assert_eq!(view.health, actor.health, "health of {}", actor.id);
        assert_eq!(view.position, actor.position, "position of {}", actor.id);
        assert_eq!(view.moving, actor.is_moving(), "moving flag of {}", actor.id);
    }
}

#[tokio::test]
async fn spectator_tracks_a_walk() {
    let runtime = Runtime::builder()
        .config(RuntimeConfig::manual())
        .setup(skirmish())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    let host = ObserverClient::connect(handle.clone(), Some(TeamId::Zero))
        .await
        .unwrap();
    let mut spectator = ObserverClient::connect(handle.clone(), None).await.unwrap();

    let ticket = host.request_move(Point::ground(2.0, 0.0)).await.unwrap();
    handle.advance(TICK).await.unwrap();
    assert!(ticket.wait().await.unwrap().is_accepted());

    spectator.sync().await.unwrap();
    assert!(spectator.replica().actor(ActorId(1)).unwrap().moving);

    for _ in 0..10 {
        handle.advance(TICK).await.unwrap();
    }
    spectator.sync().await.unwrap();

    let state = handle.query_state().await.unwrap();
    assert_converged(spectator.replica(), &state);
    let walker = spectator.replica().actor(ActorId(1)).unwrap();
    assert!(!walker.moving);
    assert_eq!(walker.position, Point::ground(2.0, 0.0));

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn late_observer_converges_from_snapshot() {
    let runtime = Runtime::builder()
        .config(RuntimeConfig::manual())
        .setup(skirmish())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    let host = ObserverClient::connect(handle.clone(), Some(TeamId::Zero))
        .await
        .unwrap();

    host.request_move(Point::ground(1.5, 0.5)).await.unwrap();
    for _ in 0..10 {
        handle.advance(TICK).await.unwrap();
    }
    handle.end_turn().await.unwrap();

    let late = ObserverClient::connect(handle.clone(), None).await.unwrap();
    let state = handle.query_state().await.unwrap();
    assert_converged(late.replica(), &state);
    assert_eq!(late.replica().active_actor_id(), Some(ActorId(3)));

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn resync_is_idempotent() {
    let runtime = Runtime::builder()
        .config(RuntimeConfig::manual())
        .setup(skirmish())
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();
    let mut spectator = ObserverClient::connect(handle.clone(), None).await.unwrap();

    handle.end_turn().await.unwrap();
    spectator.sync().await.unwrap();
    let before = spectator.replica().clone();

    // Replaying the full surface changes nothing already applied.
    spectator.resync().await.unwrap();
    spectator.sync().await.unwrap();

    let state = handle.query_state().await.unwrap();
    assert_converged(spectator.replica(), &state);
    assert_eq!(
        spectator.replica().active_actor_id(),
        before.active_actor_id()
    );

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn scripted_teams_play_to_a_result() {
    let mut config = RuntimeConfig::default();
    config.tick_mode = TickMode::Realtime;
    config.tick_interval = Duration::from_millis(5);
    config.match_rules.post_attack_delay = 0.0;
    config.match_rules.attack_damage = 5;

    let mut setup = MatchSetup::new();
    setup.spawn(TeamId::Zero, Archetype::Standard, Point::ground(0.0, 0.0)).unwrap();
    setup.spawn(TeamId::One, Archetype::Standard, Point::ground(2.0, 0.0)).unwrap();

    let runtime = Runtime::builder()
        .config(config)
        .setup(setup)
        .build()
        .await
        .unwrap();
    let handle = runtime.handle();

    let mut host = ObserverClient::connect(handle.clone(), Some(TeamId::Zero))
        .await
        .unwrap();
    let mut guest = ObserverClient::connect(handle.clone(), Some(TeamId::One))
        .await
        .unwrap();
    let mut spectator = ObserverClient::connect(handle.clone(), None).await.unwrap();

    let host_task = tokio::spawn(async move { host.play(&SkirmishProvider).await });
    let guest_task = tokio::spawn(async move { guest.play(&SkirmishProvider).await });

    let result = tokio::time::timeout(Duration::from_secs(20), async {
        loop {
            if let Event::Notification(Notification::MatchEnded { result }) =
                spectator.next_event().await?
            {
                return Ok::<_, tactics_runtime::RuntimeError>(result);
            }
        }
    })
    .await
    .expect("match should finish")
    .unwrap();

    // Team 0 closes the gap first and lands the first hit.
    assert_eq!(result, MatchResult::Win(TeamId::Zero));
    assert_eq!(host_task.await.unwrap().unwrap(), result);
    assert_eq!(guest_task.await.unwrap().unwrap(), result);

    let state = handle.query_state().await.unwrap();
    assert_converged(spectator.replica(), &state);

    runtime.shutdown().await.unwrap();
}
