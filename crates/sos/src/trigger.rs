//! SOS trigger: preconditions, dispatch and debouncing

use guardian_rust_session::SessionRepository;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::alert::EmergencyAlert;
use crate::gateway::{GatewayReceipt, SmsGateway};
use crate::location::{Coordinates, LocationProvider, Permission};
use crate::press::{HardwareKey, PressConfig, PressDetector};
use crate::{Precondition, Result, SosError};

/// How long a mount waits for the first location fix
pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_secs(15);

/// What activated the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// Tap or long press on the SOS control
    Button,
    /// Completed hardware key pattern
    HardwareKeys,
}

impl TriggerSource {
    fn index(self) -> usize {
        match self {
            Self::Button => 0,
            Self::HardwareKeys => 1,
        }
    }
}

/// A delivered alert
#[derive(Debug, Clone, PartialEq)]
pub struct SentAlert {
    pub alert: EmergencyAlert,
    pub receipt: GatewayReceipt,
}

/// Result of an activation
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Sent(SentAlert),
    /// The same source already has a send in flight; nothing was sent
    InFlight,
}

/// Clears a source's in-flight flag when the send finishes
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The SOS trigger of the home screen.
///
/// Location and contact are captured by [`SosTrigger::mount`]; each send is
/// independent and never retried. Dropping the screen should call
/// [`SosTrigger::unmount`], which abandons outstanding requests.
pub struct SosTrigger {
    repository: SessionRepository,
    gateway: Arc<dyn SmsGateway>,
    location: RwLock<Option<Coordinates>>,
    emergency_contact: RwLock<Option<String>>,
    presses: Mutex<PressDetector>,
    in_flight: [AtomicBool; 2],
    fix_timeout: Duration,
    cancel: CancellationToken,
}

impl SosTrigger {
    pub fn new(
        repository: SessionRepository,
        gateway: Arc<dyn SmsGateway>,
        press_config: PressConfig,
    ) -> Self {
        Self {
            repository,
            gateway,
            location: RwLock::new(None),
            emergency_contact: RwLock::new(None),
            presses: Mutex::new(PressDetector::new(press_config)),
            in_flight: [AtomicBool::new(false), AtomicBool::new(false)],
            fix_timeout: DEFAULT_FIX_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    /// Set how long [`SosTrigger::mount`] waits for a position
    pub fn with_fix_timeout(mut self, value: Duration) -> Self {
        self.fix_timeout = value;
        self
    }

    /// Load the emergency contact and take one location fix.
    ///
    /// The contact is loaded even when location access is refused; the
    /// refusal is still reported so the caller can tell the user.
    pub async fn mount(&self, provider: &dyn LocationProvider) -> Result<()> {
        let contact = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SosError::Cancelled),
            contact = self.repository.emergency_contact() => contact,
        };
        if contact.is_none() {
            debug!("No emergency contact in cached profile");
        }
        *self.emergency_contact.write().await = contact;

        let fix = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SosError::Cancelled),
            fix = self.acquire_fix(provider) => fix?,
        };
        *self.location.write().await = Some(fix);
        debug!("Location fix acquired");
        Ok(())
    }

    async fn acquire_fix(&self, provider: &dyn LocationProvider) -> Result<Coordinates> {
        if provider.request_permission().await != Permission::Granted {
            warn!("Location permission denied, SOS will have no fix");
            return Err(SosError::PermissionDenied);
        }
        match tokio::time::timeout(self.fix_timeout, provider.current_position()).await {
            Ok(fix) => fix,
            Err(_) => {
                warn!("No location fix within {:?}", self.fix_timeout);
                Err(SosError::LocationError(format!(
                    "no fix within {}s",
                    self.fix_timeout.as_secs_f32()
                )))
            }
        }
    }

    /// Abandon outstanding requests. Results arriving later are dropped.
    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub async fn location(&self) -> Option<Coordinates> {
        *self.location.read().await
    }

    pub async fn emergency_contact(&self) -> Option<String> {
        self.emergency_contact.read().await.clone()
    }

    /// Compose and send one alert.
    ///
    /// Preconditions are checked before anything touches the network: the
    /// location fix first, then the emergency contact.
    pub async fn send_sos(&self) -> Result<SentAlert> {
        if self.cancel.is_cancelled() {
            return Err(SosError::Cancelled);
        }

        let coordinates = self
            .location()
            .await
            .ok_or(SosError::PreconditionMissing(Precondition::Location))?;
        let recipient = self
            .emergency_contact()
            .await
            .ok_or(SosError::PreconditionMissing(Precondition::EmergencyContact))?;

        let alert = EmergencyAlert::compose(recipient, coordinates);
        info!("Sending SOS alert");

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("SOS send abandoned after unmount");
                return Err(SosError::Cancelled);
            }
            outcome = self.gateway.send(&alert) => outcome,
        };

        match outcome {
            Ok(receipt) => {
                info!("SOS alert sent");
                Ok(SentAlert { alert, receipt })
            }
            Err(err) => {
                error!("SOS alert failed: {}", err);
                Err(err)
            }
        }
    }

    /// Activate from `source`.
    ///
    /// Each source allows one send in flight; a second activation from the
    /// same source during that send returns [`Dispatch::InFlight`]. Sources do
    /// not block each other.
    pub async fn activate(&self, source: TriggerSource) -> Result<Dispatch> {
        let Some(_guard) = InFlight::acquire(&self.in_flight[source.index()]) else {
            debug!("{:?} activation ignored, send already in flight", source);
            return Ok(Dispatch::InFlight);
        };
        self.send_sos().await.map(Dispatch::Sent)
    }

    /// Feed a hardware key event. Activates
    /// [`TriggerSource::HardwareKeys`] when the press pattern completes.
    pub async fn record_press(&self, key: HardwareKey, at: Instant) -> Result<Option<Dispatch>> {
        let fired = self.presses.lock().await.record(key, at);
        if !fired {
            return Ok(None);
        }
        info!("Hardware key pattern completed");
        self.activate(TriggerSource::HardwareKeys).await.map(Some)
    }

    /// Presses counted towards the pattern at `now`
    pub async fn pending_presses(&self, now: Instant) -> usize {
        self.presses.lock().await.pending(now)
    }
}
