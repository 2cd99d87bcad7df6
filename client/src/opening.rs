use casedrop_types::{Disposition, RewardTableEntry};
use thiserror::Error;
use tracing::{debug, warn};

/// Error type for opening flow transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("an open request is already in flight")]
    OpenInFlight,
    #[error("a settle request is already in flight")]
    SettleInFlight,
    #[error("operation not valid in the current phase")]
    InvalidPhase,
    #[error("winning slot does not hold the awarded reward")]
    SynchronizationMismatch,
}

/// Where an opening session currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No open has been dispatched.
    Idle,
    /// An open was dispatched and the reveal has not arrived yet.
    Opening,
    /// The reveal arrived and the reel animation is running.
    Spinning,
    /// The reel stopped and the player is choosing a disposition.
    Settling,
    /// The settlement was confirmed. Terminal.
    Complete,
    /// The session failed. Terminal.
    Error,
}

/// Client-side state machine for a single case opening.
///
/// The server's reveal is authoritative: the reward it reports is the reward
/// the player gets, and the reel is only a visualization of it. The flow
/// tracks one open and one settle request at a time, and carries a generation
/// counter so that animation callbacks scheduled before a cancel cannot
/// advance a later session.
pub struct OpeningFlow {
    case_id: u64,
    session_id: Option<u64>,
    phase: Phase,
    generation: u64,

    open_in_flight: bool,
    settle_in_flight: bool,

    reward: Option<RewardTableEntry>,
    roulette: Vec<RewardTableEntry>,
    winner_index: u32,
    disposition: Option<Disposition>,
    final_balance: Option<u64>,
    error: Option<String>,
}

impl OpeningFlow {
    pub fn new(case_id: u64) -> Self {
        Self {
            case_id,
            session_id: None,
            phase: Phase::Idle,
            generation: 0,
            open_in_flight: false,
            settle_in_flight: false,
            reward: None,
            roulette: Vec::new(),
            winner_index: 0,
            disposition: None,
            final_balance: None,
            error: None,
        }
    }

    pub fn case_id(&self) -> u64 {
        self.case_id
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The authoritative reward, once revealed.
    pub fn reward(&self) -> Option<&RewardTableEntry> {
        self.reward.as_ref()
    }

    pub fn roulette(&self) -> &[RewardTableEntry] {
        &self.roulette
    }

    pub fn winner_index(&self) -> u32 {
        self.winner_index
    }

    pub fn disposition(&self) -> Option<Disposition> {
        self.disposition
    }

    pub fn final_balance(&self) -> Option<u64> {
        self.final_balance
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record that an open was dispatched for `session_id`.
    ///
    /// Only valid from `Idle`: a completed or failed flow is never reopened,
    /// and at most one open may be outstanding.
    pub fn begin(&mut self, session_id: u64) -> Result<(), FlowError> {
        if self.open_in_flight {
            return Err(FlowError::OpenInFlight);
        }
        if self.phase != Phase::Idle {
            return Err(FlowError::InvalidPhase);
        }

        self.session_id = Some(session_id);
        self.open_in_flight = true;
        self.phase = Phase::Opening;
        debug!(session_id, case_id = self.case_id, "opening dispatched");
        Ok(())
    }

    /// Record the server's reveal and start the reel.
    ///
    /// Returns the generation that a later [`Self::spin_finished`] call must
    /// present. The reel must hold the awarded reward at the winning slot; a
    /// reel that disagrees with the reward is fatal to the session.
    pub fn reward_received(
        &mut self,
        reward: RewardTableEntry,
        roulette: Vec<RewardTableEntry>,
        winner_index: u32,
    ) -> Result<u64, FlowError> {
        if self.phase != Phase::Opening {
            return Err(FlowError::InvalidPhase);
        }
        self.open_in_flight = false;

        let consistent = roulette
            .get(winner_index as usize)
            .is_some_and(|slot| slot.id == reward.id);
        if !consistent {
            warn!(
                session_id = ?self.session_id,
                winner_index,
                reward_id = reward.id,
                "reveal sequence does not match awarded reward"
            );
            self.reward = Some(reward);
            self.set_error("reveal sequence does not match awarded reward");
            return Err(FlowError::SynchronizationMismatch);
        }

        self.reward = Some(reward);
        self.roulette = roulette;
        self.winner_index = winner_index;
        self.phase = Phase::Spinning;
        Ok(self.generation)
    }

    /// Record that the reel animation stopped.
    ///
    /// Returns whether the flow advanced. Duplicate timer callbacks and
    /// callbacks from a cancelled session present a stale generation or a
    /// non-spinning phase and are ignored.
    pub fn spin_finished(&mut self, generation: u64) -> bool {
        if self.phase != Phase::Spinning || generation != self.generation {
            return false;
        }
        self.phase = Phase::Settling;
        true
    }

    /// Record that a settlement was dispatched with `disposition`.
    pub fn choose(&mut self, disposition: Disposition) -> Result<(), FlowError> {
        if self.phase != Phase::Settling {
            return Err(FlowError::InvalidPhase);
        }
        if self.settle_in_flight {
            return Err(FlowError::SettleInFlight);
        }

        self.settle_in_flight = true;
        self.disposition = Some(disposition);
        debug!(session_id = ?self.session_id, ?disposition, "settlement dispatched");
        Ok(())
    }

    /// Record the settlement confirmation.
    pub fn settled(&mut self, new_balance: u64) -> Result<(), FlowError> {
        if self.phase != Phase::Settling || !self.settle_in_flight {
            return Err(FlowError::InvalidPhase);
        }

        self.settle_in_flight = false;
        self.final_balance = Some(new_balance);
        self.phase = Phase::Complete;
        Ok(())
    }

    /// Fail the session. Terminal from any non-terminal phase.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if matches!(self.phase, Phase::Complete | Phase::Error) {
            return;
        }
        self.set_error(reason);
    }

    /// Abandon the session and return to `Idle`.
    ///
    /// Bumps the generation so that any animation callback scheduled for the
    /// abandoned session is ignored, and clears in-flight markers. The next
    /// [`Self::begin`] must present a fresh session id: if an open already
    /// landed for the abandoned id, the session exists server-side and its
    /// id cannot be reused.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.open_in_flight = false;
        self.settle_in_flight = false;
        self.session_id = None;
        self.reward = None;
        self.roulette = Vec::new();
        self.winner_index = 0;
        self.disposition = None;
        self.final_balance = None;
        self.error = None;
        self.phase = Phase::Idle;
    }

    fn set_error(&mut self, reason: impl Into<String>) {
        self.open_in_flight = false;
        self.settle_in_flight = false;
        self.error = Some(reason.into());
        self.phase = Phase::Error;
    }
}
