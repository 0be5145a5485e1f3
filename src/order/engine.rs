use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::format::PriceFormatter;
use super::model::{ExtraId, ExtrasPayload, FoodId, OrderRecord};
use super::session::SelectionSession;
use crate::api::{ApiError, DataApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Uninitialized,
    Loading,
    Ready,
    Failed,
    Submitting,
    Completed,
    Discarded,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Submitting => "submitting",
            Self::Completed => "completed",
            Self::Discarded => "discarded",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("failed to load food {id}: {source}")]
    Load {
        id: FoodId,
        #[source]
        source: ApiError,
    },
    #[error("extra {0} is not part of this item")]
    ExtraNotFound(ExtraId),
    #[error("failed to sync favorite: {0}")]
    FavoriteSync(#[source] ApiError),
    #[error("failed to submit order: {0}")]
    OrderSubmission(#[source] ApiError),
    #[error("order total exceeds the supported amount")]
    TotalOverflow,
    #[error("operation not allowed while session is {0}")]
    InvalidState(SessionStatus),
    #[error("session was discarded")]
    Discarded,
}

/// Point-in-time copy of a session for the presentation layer.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub status: SessionStatus,
    pub session: Option<SelectionSession>,
    pub total: Option<Decimal>,
    pub formatted_total: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub formatter: PriceFormatter,
    pub extras_payload: ExtrasPayload,
}

struct Inner {
    status: SessionStatus,
    // rotated on every load and on discard; late responses carrying an old
    // epoch must not touch the session
    epoch: Uuid,
    session: Option<SelectionSession>,
}

/// Customization state for one food item, backed by a [`DataApi`].
///
/// All methods take `&self`. The state lock is never held across a remote
/// call, so quantities can change while a load, toggle or submit is pending.
pub struct OrderSelectionEngine {
    api: Arc<dyn DataApi>,
    options: EngineOptions,
    inner: Mutex<Inner>,
    favorite_gate: tokio::sync::Mutex<()>,
}

impl OrderSelectionEngine {
    pub fn new(api: Arc<dyn DataApi>, options: EngineOptions) -> Self {
        Self {
            api,
            options,
            inner: Mutex::new(Inner {
                status: SessionStatus::Uninitialized,
                epoch: Uuid::new_v4(),
                session: None,
            }),
            favorite_gate: tokio::sync::Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status
    }

    /// Fetches the item and the favorites list and opens the session.
    ///
    /// Allowed from `Uninitialized` and `Failed`; a failed load can simply be
    /// retried.
    #[instrument(skip(self))]
    pub async fn load(&self, id: FoodId) -> Result<(), OrderError> {
        let epoch = {
            let mut inner = self.lock();
            match inner.status {
                SessionStatus::Uninitialized | SessionStatus::Failed => {}
                other => return Err(OrderError::InvalidState(other)),
            }
            inner.status = SessionStatus::Loading;
            inner.session = None;
            inner.epoch = Uuid::new_v4();
            inner.epoch
        };

        let fetched = async {
            let mut item = self.api.fetch_item(id).await?;
            item.formatted_price = Some(self.options.formatter.format(item.price));
            let favorites = self.api.fetch_favorites().await?;
            let favorite = favorites.iter().any(|f| f.id == id);
            Ok::<_, ApiError>(SelectionSession::new(item, favorite))
        }
        .await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            debug!(food_id = %id, "dropping load response for discarded session");
            return Err(OrderError::Discarded);
        }
        match fetched {
            Ok(session) => {
                info!(
                    food_id = %id,
                    extras = session.extras().len(),
                    favorite = session.is_favorite(),
                    "session ready"
                );
                inner.session = Some(session);
                inner.status = SessionStatus::Ready;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, food_id = %id, "load failed");
                inner.status = SessionStatus::Failed;
                Err(OrderError::Load { id, source: e })
            }
        }
    }

    /// Runs `f` against the open session. Quantity edits stay allowed while
    /// a submission is pending.
    fn with_session<T>(
        &self,
        f: impl FnOnce(&mut SelectionSession) -> Result<T, OrderError>,
    ) -> Result<T, OrderError> {
        let mut inner = self.lock();
        let status = inner.status;
        match (status, inner.session.as_mut()) {
            (SessionStatus::Ready | SessionStatus::Submitting, Some(session)) => f(session),
            _ => Err(OrderError::InvalidState(status)),
        }
    }

    /// Rejected with `TotalOverflow` (and rolled back) when the new total
    /// would not be representable.
    pub fn increment_extra(&self, extra_id: ExtraId) -> Result<u32, OrderError> {
        let qty = self.with_session(|s| {
            let qty = s
                .increment_extra(extra_id)
                .ok_or(OrderError::ExtraNotFound(extra_id))?;
            if s.total().is_none() {
                s.decrement_extra(extra_id);
                return Err(OrderError::TotalOverflow);
            }
            Ok(qty)
        })?;
        debug!(%extra_id, quantity = qty, "extra incremented");
        Ok(qty)
    }

    /// Decrementing at zero leaves the quantity as is.
    pub fn decrement_extra(&self, extra_id: ExtraId) -> Result<u32, OrderError> {
        let qty = self.with_session(|s| {
            s.decrement_extra(extra_id)
                .ok_or(OrderError::ExtraNotFound(extra_id))
        })?;
        debug!(%extra_id, quantity = qty, "extra decremented");
        Ok(qty)
    }

    pub fn increment_base_quantity(&self) -> Result<u32, OrderError> {
        self.with_session(|s| {
            let before = s.base_quantity();
            let qty = s.increment_base_quantity();
            if qty != before && s.total().is_none() {
                s.decrement_base_quantity();
                return Err(OrderError::TotalOverflow);
            }
            Ok(qty)
        })
    }

    pub fn decrement_base_quantity(&self) -> Result<u32, OrderError> {
        self.with_session(|s| Ok(s.decrement_base_quantity()))
    }

    pub fn compute_total(&self) -> Result<Decimal, OrderError> {
        self.with_session(|s| s.total().ok_or(OrderError::TotalOverflow))
    }

    pub fn formatted_total(&self) -> Result<String, OrderError> {
        let total = self.compute_total()?;
        Ok(self.options.formatter.format(total))
    }

    /// Adds or removes the item from the remote favorites, then flips the
    /// local flag. Toggles queue behind each other; the flag is unchanged when
    /// the remote call fails.
    #[instrument(skip(self))]
    pub async fn toggle_favorite(&self) -> Result<bool, OrderError> {
        let _in_flight = self.favorite_gate.lock().await;

        let (epoch, favorite, item) = {
            let inner = self.lock();
            match (inner.status, inner.session.as_ref()) {
                (SessionStatus::Ready | SessionStatus::Submitting, Some(s)) => {
                    let item = s.favorite_payload(self.options.extras_payload);
                    (inner.epoch, s.is_favorite(), item)
                }
                (status, _) => return Err(OrderError::InvalidState(status)),
            }
        };

        let synced = if favorite {
            self.api.remove_favorite(item.id).await
        } else {
            self.api.add_favorite(&item).await
        };
        if let Err(e) = synced {
            warn!(error = %e, food_id = %item.id, favorite, "favorite sync failed");
            return Err(OrderError::FavoriteSync(e));
        }

        let mut inner = self.lock();
        if inner.epoch != epoch {
            return Err(OrderError::Discarded);
        }
        let session = inner
            .session
            .as_mut()
            .ok_or(OrderError::InvalidState(SessionStatus::Discarded))?;
        session.set_favorite(!favorite);
        info!(food_id = %item.id, favorite = !favorite, "favorite toggled");
        Ok(!favorite)
    }

    /// Sends the order. On success the session is `Completed` and the caller
    /// should navigate away; on failure it goes back to `Ready`.
    #[instrument(skip(self))]
    pub async fn submit_order(&self) -> Result<OrderRecord, OrderError> {
        let (epoch, record) = {
            let mut inner = self.lock();
            let status = inner.status;
            let record = match (status, inner.session.as_ref()) {
                (SessionStatus::Ready, Some(s)) => s.order_record(self.options.extras_payload),
                _ => return Err(OrderError::InvalidState(status)),
            };
            inner.status = SessionStatus::Submitting;
            (inner.epoch, record)
        };

        let sent = self.api.create_order(&record).await;

        let mut inner = self.lock();
        if inner.epoch != epoch {
            debug!(food_id = %record.product_id, "dropping order response for discarded session");
            return Err(OrderError::Discarded);
        }
        match sent {
            Ok(()) => {
                inner.status = SessionStatus::Completed;
                info!(food_id = %record.product_id, "order submitted");
                Ok(record)
            }
            Err(e) => {
                inner.status = SessionStatus::Ready;
                warn!(error = %e, food_id = %record.product_id, "order submission failed");
                Err(OrderError::OrderSubmission(e))
            }
        }
    }

    /// Ends the session. Responses to calls still in flight are ignored.
    pub fn discard(&self) {
        let mut inner = self.lock();
        inner.epoch = Uuid::new_v4();
        inner.session = None;
        inner.status = SessionStatus::Discarded;
        debug!("session discarded");
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let inner = self.lock();
        let total = inner.session.as_ref().and_then(SelectionSession::total);
        EngineSnapshot {
            status: inner.status,
            session: inner.session.clone(),
            total,
            formatted_total: total.map(|t| self.options.formatter.format(t)),
        }
    }
}
