//! Game State Machine
//!
//! Five-state machine with broadcast change notifications and the
//! pre-game-over grace window.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::observer::{Observers, SubscriptionId};

// =============================================================================
// GAME STATE
// =============================================================================

/// Phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum GameState {
    /// Track built, waiting for the run to start
    #[default]
    Prepare = 0,
    /// Run in progress
    Playing = 1,
    /// Run suspended
    Paused = 2,
    /// Grace window after a hazard signal
    PreGameOver = 3,
    /// Run over; only a restart leaves this state
    GameOver = 4,
}

/// A transition, broadcast to listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    /// State after the transition
    pub new: GameState,
    /// State before the transition
    pub old: GameState,
}

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Current state, its listeners and the grace window.
#[derive(Debug, Default)]
pub struct StateMachine {
    state: GameState,
    listeners: Observers<StateChange>,
    /// State to restore when the armed grace window expires
    grace: Option<GameState>,
}

impl StateMachine {
    /// Machine in `Prepare` with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Transition to `new`. Listeners are notified only when the state
    /// actually changes. Returns whether it changed.
    pub fn set_state(&mut self, new: GameState) -> bool {
        if new == self.state {
            return false;
        }

        let old = self.state;
        self.state = new;
        debug!("state {:?} -> {:?}", old, new);
        self.listeners.emit(&StateChange { new, old });
        true
    }

    /// Register a change listener.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StateChange) + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Remove a change listener.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ========================================================================
    // Grace window
    // ========================================================================

    /// Enter the grace window: remember the current state and switch to
    /// `PreGameOver`. Returns false if already armed or the run is over.
    pub fn arm_grace(&mut self) -> bool {
        if self.grace.is_some() || self.state == GameState::GameOver {
            return false;
        }

        self.grace = Some(self.state);
        self.set_state(GameState::PreGameOver);
        true
    }

    /// Grace countdown elapsed. Restores the remembered state unless the
    /// run ended meanwhile, in which case the window stays armed.
    pub fn expire_grace(&mut self) -> bool {
        if self.state == GameState::GameOver {
            return false;
        }

        match self.grace.take() {
            Some(prior) => {
                self.set_state(prior);
                true
            }
            None => false,
        }
    }

    /// Whether the grace window is armed.
    pub fn is_grace_armed(&self) -> bool {
        self.grace.is_some()
    }

    /// Clear the grace window without touching the state.
    pub fn disarm_grace(&mut self) {
        self.grace = None;
    }

    // ========================================================================
    // Pause
    // ========================================================================

    /// Playing -> Paused.
    pub fn pause(&mut self) -> bool {
        self.state == GameState::Playing && self.set_state(GameState::Paused)
    }

    /// Paused -> Playing.
    pub fn resume(&mut self) -> bool {
        self.state == GameState::Paused && self.set_state(GameState::Playing)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorded(machine: &mut StateMachine) -> Rc<RefCell<Vec<StateChange>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        machine.subscribe(move |change| sink.borrow_mut().push(*change));
        log
    }

    fn any_state() -> impl Strategy<Value = GameState> {
        prop_oneof![
            Just(GameState::Prepare),
            Just(GameState::Playing),
            Just(GameState::Paused),
            Just(GameState::PreGameOver),
            Just(GameState::GameOver),
        ]
    }

    #[test]
    fn test_redundant_transition_is_silent() {
        let mut machine = StateMachine::new();
        let log = recorded(&mut machine);

        assert!(!machine.set_state(GameState::Prepare));
        assert!(machine.set_state(GameState::Playing));
        assert!(!machine.set_state(GameState::Playing));

        assert_eq!(
            *log.borrow(),
            vec![StateChange { new: GameState::Playing, old: GameState::Prepare }]
        );
    }

    #[test]
    fn test_listeners_in_registration_order() {
        let mut machine = StateMachine::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..3 {
            let order = Rc::clone(&order);
            machine.subscribe(move |_| order.borrow_mut().push(tag));
        }

        machine.set_state(GameState::Playing);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut machine = StateMachine::new();
        let log = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&log);
        let id = machine.subscribe(move |_| *sink.borrow_mut() += 1);

        machine.set_state(GameState::Playing);
        assert!(machine.unsubscribe(id));
        assert!(!machine.unsubscribe(id));
        machine.set_state(GameState::Paused);

        assert_eq!(*log.borrow(), 1);
        assert_eq!(machine.listener_count(), 0);
    }

    #[test]
    fn test_grace_reverts_to_entry_state() {
        let mut machine = StateMachine::new();
        machine.set_state(GameState::Playing);

        assert!(machine.arm_grace());
        assert_eq!(machine.state(), GameState::PreGameOver);
        assert!(!machine.arm_grace());

        assert!(machine.expire_grace());
        assert_eq!(machine.state(), GameState::Playing);
        assert!(!machine.is_grace_armed());
    }

    #[test]
    fn test_grace_stays_armed_after_game_over() {
        let mut machine = StateMachine::new();
        machine.set_state(GameState::Playing);
        machine.arm_grace();
        machine.set_state(GameState::GameOver);

        assert!(!machine.expire_grace());
        assert_eq!(machine.state(), GameState::GameOver);
        assert!(machine.is_grace_armed());
        assert!(!machine.arm_grace());
    }

    #[test]
    fn test_pause_resume() {
        let mut machine = StateMachine::new();
        assert!(!machine.pause());

        machine.set_state(GameState::Playing);
        assert!(machine.pause());
        assert_eq!(machine.state(), GameState::Paused);
        assert!(!machine.pause());

        assert!(machine.resume());
        assert_eq!(machine.state(), GameState::Playing);
        assert!(!machine.resume());
    }

    proptest! {
        #[test]
        fn prop_notifies_iff_changed(states in prop::collection::vec(any_state(), 0..64)) {
            let mut machine = StateMachine::new();
            let log = recorded(&mut machine);

            let mut current = GameState::Prepare;
            let mut expected = Vec::new();
            for state in states {
                let changed = machine.set_state(state);
                prop_assert_eq!(changed, state != current);
                if changed {
                    expected.push(StateChange { new: state, old: current });
                    current = state;
                }
            }

            prop_assert_eq!(&*log.borrow(), &expected);
            prop_assert_eq!(machine.state(), current);
        }
    }
}
