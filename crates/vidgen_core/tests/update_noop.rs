use vidgen_core::{update, AppState, Msg, PollPhase};

#[test]
fn idle_messages_leave_state_untouched() {
    let idle = AppState::new();
    for msg in [
        Msg::NoOp,
        Msg::RefreshClicked,
        Msg::CancelClicked,
        Msg::ScriptRequested,
        Msg::AssetsRequested,
        Msg::ViewClosed,
        Msg::Tick { now: 10_000 },
    ] {
        let (next, effects) = update(idle.clone(), msg.clone());
        assert!(effects.is_empty(), "{msg:?} produced effects");
        assert_eq!(next, idle, "{msg:?} changed state");
    }
    assert_eq!(idle.poll_phase(), PollPhase::Idle);
    assert_eq!(idle.next_poll_at(), None);
}
