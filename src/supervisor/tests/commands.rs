//! Write-through command surface.

use super::*;
use crate::remote::RemoteError;
use crate::testing::RecordedCommand;
use crate::GameMode;

#[tokio::test]
async fn write_through_commands_arrive_in_order() {
    let remote = ScriptedRemote::new();
    let (supervisor, _rx) = connected_supervisor(&remote, ClientSnapshot::default()).await;

    supervisor.set_spectate_target(7).await.expect("command");
    supervisor.set_beatmap("d41d8cd9").await.expect("command");
    supervisor.set_dim_level(80).await.expect("command");
    supervisor.set_menu_time(1_234).await.expect("command");
    supervisor.set_mode(GameMode::Play).await.expect("command");
    supervisor.wake_up().await.expect("command");

    assert_eq!(
        remote.commands(),
        vec![
            RecordedCommand::SetSpectateTarget(7),
            RecordedCommand::SetBeatmap("d41d8cd9".to_string()),
            RecordedCommand::SetDimLevel(80),
            RecordedCommand::SetMenuTime(1_234),
            RecordedCommand::ChangeMode(GameMode::Play),
            RecordedCommand::WakeUp,
        ]
    );
}

#[tokio::test]
async fn commands_require_an_established_link() {
    let remote = ScriptedRemote::new();
    let supervisor = supervisor_with(&remote);

    let err = supervisor
        .set_spectate_target(7)
        .await
        .expect_err("no link yet");
    assert!(matches!(err, RemoteError::NotConnected));
    assert!(remote.commands().is_empty());
}

#[tokio::test]
async fn matching_toggle_value_issues_no_command() {
    let remote = ScriptedRemote::new();
    let snapshot = ClientSnapshot {
        buffering: false,
        skip_calculations: true,
        ..ClientSnapshot::default()
    };
    let (supervisor, _rx) = connected_supervisor(&remote, snapshot).await;

    supervisor.set_buffering(false).await.expect("no-op");
    supervisor.set_skip_calculations(true).await.expect("no-op");

    assert!(remote.commands().is_empty());
}

#[tokio::test]
async fn opposite_toggle_value_issues_one_toggle() {
    let remote = ScriptedRemote::new();
    let snapshot = ClientSnapshot {
        buffering: false,
        skip_calculations: true,
        ..ClientSnapshot::default()
    };
    let (supervisor, _rx) = connected_supervisor(&remote, snapshot).await;

    supervisor.set_buffering(true).await.expect("toggle");
    supervisor.set_skip_calculations(false).await.expect("toggle");

    assert_eq!(
        remote.commands(),
        vec![
            RecordedCommand::ToggleBuffering,
            RecordedCommand::ToggleSkipCalculations,
        ]
    );
}

#[tokio::test]
async fn play_audio_skips_when_already_playing() {
    let remote = ScriptedRemote::new();
    let snapshot = ClientSnapshot {
        audio_playing: true,
        ..ClientSnapshot::default()
    };
    let (supervisor, _rx) = connected_supervisor(&remote, snapshot).await;

    supervisor.play_audio().await.expect("no-op");
    assert!(remote.commands().is_empty());
}

#[tokio::test]
async fn play_audio_issues_command_when_stopped() {
    let remote = ScriptedRemote::new();
    let (supervisor, _rx) = connected_supervisor(&remote, ClientSnapshot::default()).await;

    supervisor.play_audio().await.expect("command");
    assert_eq!(remote.commands(), vec![RecordedCommand::PlayAudio]);
}

#[tokio::test]
async fn cached_reads_reflect_the_last_poll() {
    let remote = ScriptedRemote::new();
    let snapshot = ClientSnapshot {
        mode: GameMode::Play,
        spectating_id: 5,
        dim_level: 80,
        menu_time: 44_100,
        beatmap_checksum: "deadbeef".to_string(),
        audio_playing: true,
        buffering: true,
        ..ClientSnapshot::default()
    };
    let (supervisor, _rx) = connected_supervisor(&remote, snapshot).await;

    assert_eq!(supervisor.mode(), GameMode::Play);
    assert_eq!(supervisor.spectating_id(), 5);
    assert_eq!(supervisor.dim_level(), 80);
    assert_eq!(supervisor.menu_time(), 44_100);
    assert_eq!(supervisor.beatmap(), "deadbeef");
    assert!(supervisor.audio_playing());
    assert!(supervisor.buffering());
    assert!(!supervisor.skip_calculations());
}
