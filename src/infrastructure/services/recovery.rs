//! Dual-copy verification and repair.
//!
//! Runs before any mutation of the store. Exactly one corrupt copy is
//! rebuilt from the other and the pair is verified again; two corrupt
//! copies, or repairs that do not converge, end in a halt.

use heapless::Vec;

use crate::{
    config::MAX_RECOVERY_RETRIES,
    domain::{
        entity::CopyRegion,
        errors::{HaltReason, StoreError},
        ports::FlashPrimitive,
    },
    infrastructure::{
        repositories::ImageBuffer,
        services::persistence::{load_copy, persist_copy, verify_copy},
    },
};

/// One attempt to rebuild a copy from the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairAttempt {
    pub target: CopyRegion,
    /// Erase or program failure, `None` when the copy was rewritten
    pub error: Option<StoreError>,
}

/// Outcome of a recovery pass that reached a consistent pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    attempts: Vec<RepairAttempt, MAX_RECOVERY_RETRIES>,
    repairs: Vec<CopyRegion, MAX_RECOVERY_RETRIES>,
}

impl RecoveryReport {
    /// Copies successfully rewritten during the pass, in order.
    pub fn repairs(&self) -> &[CopyRegion] {
        &self.repairs
    }

    /// Every repair attempt, including failed ones.
    pub fn attempts(&self) -> &[RepairAttempt] {
        &self.attempts
    }

    /// Both copies were valid on the first check.
    pub fn is_clean(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Record an attempt. Returns `false` once the retry budget is spent.
    fn record(&mut self, attempt: RepairAttempt) -> bool {
        if self.attempts.push(attempt).is_err() {
            return false;
        }
        if attempt.error.is_none() {
            // Never longer than `attempts`, which was just accepted.
            return self.repairs.push(attempt.target).is_ok();
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecoveryState {
    CheckPrimary,
    CheckMirror { primary_valid: bool },
    Repair(CopyRegion),
    Consistent,
    Halt(HaltReason),
}

/// Bring the primary and mirror copies back to a consistent pair.
///
/// The image buffer is used as scratch space for repairs. A repair whose
/// erase or program fails still counts against the retry cap.
pub(crate) fn recover<F: FlashPrimitive>(
    flash: &mut F,
    image: &mut ImageBuffer,
) -> Result<RecoveryReport, StoreError> {
    let mut report = RecoveryReport::default();
    let mut state = RecoveryState::CheckPrimary;

    loop {
        state = match state {
            RecoveryState::CheckPrimary => {
                let retries = report.attempts.len();
                #[cfg(feature = "log")]
                if retries > 0 {
                    log::info!("recover retry count = {}", retries);
                }
                if retries >= MAX_RECOVERY_RETRIES {
                    RecoveryState::Halt(HaltReason::RetryLimitExceeded)
                } else {
                    RecoveryState::CheckMirror {
                        primary_valid: verify_copy(flash, CopyRegion::Primary)?,
                    }
                }
            }
            RecoveryState::CheckMirror { primary_valid } => {
                let mirror_valid = verify_copy(flash, CopyRegion::Mirror)?;
                match (primary_valid, mirror_valid) {
                    (true, true) => RecoveryState::Consistent,
                    (true, false) => RecoveryState::Repair(CopyRegion::Mirror),
                    (false, true) => RecoveryState::Repair(CopyRegion::Primary),
                    (false, false) => RecoveryState::Halt(HaltReason::DualCopyCorruption),
                }
            }
            RecoveryState::Repair(target) => {
                let attempt = repair(flash, image, target)?;
                if report.record(attempt) {
                    RecoveryState::CheckPrimary
                } else {
                    RecoveryState::Halt(HaltReason::RetryLimitExceeded)
                }
            }
            RecoveryState::Consistent => return Ok(report),
            RecoveryState::Halt(reason) => {
                #[cfg(feature = "log")]
                log::error!("data flash recovery halted: {}", reason);
                return Err(StoreError::Halted(reason));
            }
        };
    }
}

/// Rebuild `target` from the other copy.
///
/// Reading the source propagates; erase and program failures are returned
/// in the attempt so the state machine re-checks and retries.
fn repair<F: FlashPrimitive>(
    flash: &mut F,
    image: &mut ImageBuffer,
    target: CopyRegion,
) -> Result<RepairAttempt, StoreError> {
    let source = target.other();
    #[cfg(feature = "log")]
    log::warn!("recover {} from {}", target, source);

    load_copy(flash, source, image)?;
    let error = persist_copy(flash, target, image).err();
    #[cfg(feature = "log")]
    if let Some(err) = error {
        log::error!("recover {} NG: {}", target, err);
    }

    Ok(RepairAttempt { target, error })
}
