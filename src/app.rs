//! Sync coordination between the rate service, the local store, and the view.
//!
//! This module contains the `App` struct, the context object constructed
//! once at startup with its collaborators injected. It decides per
//! operation whether to read through the network or the local store, and
//! writes every successful network fetch back into the store.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::RateService;
use crate::models::{convert, pair_id, ConversionRate, Currency, EditedField};
use crate::store::StoreManager;
use crate::view::{ConversionDisplay, ViewSink};

// ============================================================================
// Constants
// ============================================================================

/// Notice shown when neither the network nor the store can supply data.
const NOTICE_NO_DATA: &str = "Cannot currently get any data";

/// Notice shown when a conversion rate is unavailable from both sources.
const NOTICE_NO_CONVERSION: &str = "Conversion not available offline";

/// Notice shown instead of dividing by a stored rate of zero.
const NOTICE_ZERO_RATE: &str = "Cannot convert with a zero rate";

const NOTICE_ONLINE: &str = "Online Mode";
const NOTICE_OFFLINE: &str = "Offline Mode";

// ============================================================================
// Sync Coordinator
// ============================================================================

/// Application context: owns the in-memory state and the exclusive write
/// access to the local store.
///
/// All failures here are fail-soft: the prior state is left intact and
/// the user sees a transient notification through the view sink.
pub struct App {
    api: Arc<dyn RateService>,
    store: StoreManager,
    view: Arc<dyn ViewSink>,

    online: bool,
    currencies: Vec<Currency>,

    // Selected pair and amount fields, mirroring the two inputs of the
    // converter. `edited` directs which way the rate is applied.
    from: String,
    to: String,
    amount_from: f64,
    amount_to: f64,
    edited: EditedField,
}

impl App {
    pub fn new(
        api: Arc<dyn RateService>,
        store: StoreManager,
        view: Arc<dyn ViewSink>,
        online: bool,
        from: &str,
        to: &str,
    ) -> Self {
        Self {
            api,
            store,
            view,
            online,
            currencies: Vec::new(),
            from: from.to_uppercase(),
            to: to.to_uppercase(),
            amount_from: 1.0,
            amount_to: 0.0,
            edited: EditedField::From,
        }
    }

    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    pub fn selected_pair(&self) -> (&str, &str) {
        (&self.from, &self.to)
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    // =========================================================================
    // Currency hydration
    // =========================================================================

    /// Populate the currency set, from the network when online and from
    /// the local store otherwise. A successful fetch replaces the store's
    /// currency collection wholesale and chains into rate hydration for
    /// the selected pair.
    pub async fn hydrate_currencies(&mut self) {
        if self.online {
            match self.api.fetch_currencies().await {
                Ok(currencies) => {
                    info!(count = currencies.len(), "Currency list fetched");
                    self.currencies = currencies;
                    self.view.render_currencies(&self.currencies);
                    self.store_currencies_background();
                    self.hydrate_selected_rate().await;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to fetch currency list");
                    self.view.show_notification(NOTICE_NO_DATA);
                }
            }
        } else {
            let stored = self.store.all_currencies();
            if stored.is_empty() {
                self.view.show_notification(NOTICE_NO_DATA);
                return;
            }
            info!(count = stored.len(), "Currency list loaded from store");
            self.currencies = stored;
            self.view.render_currencies(&self.currencies);
            self.hydrate_selected_rate().await;
        }
    }

    /// Replace the stored currency collection in the background. The
    /// caller never observes the outcome; failures are logged.
    fn store_currencies_background(&self) {
        let store = self.store.clone();
        let currencies = self.currencies.clone();
        tokio::spawn(async move {
            if let Err(e) = store.replace_all_currencies(&currencies) {
                warn!(error = %e, "Failed to persist currency list");
            }
        });
    }

    // =========================================================================
    // Rate hydration
    // =========================================================================

    /// Hydrate the conversion rate for the given pair, which becomes the
    /// selected pair. The store is the fast path: a warm entry is applied
    /// without a network call and is never refreshed while present.
    pub async fn hydrate_rate(&mut self, from: &str, to: &str) {
        self.from = from.to_uppercase();
        self.to = to.to_uppercase();
        self.hydrate_selected_rate().await;
    }

    /// Record an amount edit and re-apply the rate for the selected pair.
    pub async fn edit_amount(&mut self, field: EditedField, amount: f64) {
        self.edited = field;
        match field {
            EditedField::From => self.amount_from = amount,
            EditedField::To => self.amount_to = amount,
        }
        self.hydrate_selected_rate().await;
    }

    async fn hydrate_selected_rate(&mut self) {
        let pair = pair_id(&self.from, &self.to);

        if let Some(rate) = self.store.rate(&pair) {
            debug!(pair = %pair, "Conversion rate served from store");
            self.apply_rate(&rate);
            return;
        }

        if !self.online {
            self.view.show_notification(NOTICE_NO_CONVERSION);
            return;
        }

        match self.api.fetch_rate(&pair).await {
            Ok(rate) => {
                self.store_rate_background(&rate);
                self.apply_rate(&rate);
            }
            Err(e) => {
                warn!(pair = %pair, error = %e, "Failed to fetch conversion rate");
                self.view.show_notification(NOTICE_NO_CONVERSION);
            }
        }
    }

    /// Upsert one rate in the background; other pairs are untouched.
    /// The caller never observes the outcome; failures are logged.
    fn store_rate_background(&self, rate: &ConversionRate) {
        let store = self.store.clone();
        let rate = rate.clone();
        tokio::spawn(async move {
            if let Err(e) = store.upsert_rate(&rate) {
                warn!(pair = %rate.pair_id, error = %e, "Failed to persist conversion rate");
            }
        });
    }

    /// Apply a rate to the amount fields, directed by the last edit.
    fn apply_rate(&mut self, rate: &ConversionRate) {
        let amount = match self.edited {
            EditedField::From => self.amount_from,
            EditedField::To => self.amount_to,
        };

        let Some(result) = convert(rate.value, amount, self.edited) else {
            warn!(pair = %rate.pair_id, "Stored rate is zero, refusing to divide");
            self.view.show_notification(NOTICE_ZERO_RATE);
            return;
        };

        match self.edited {
            EditedField::From => self.amount_to = result,
            EditedField::To => self.amount_from = result,
        }

        self.view.render_conversion(&ConversionDisplay {
            from: self.from.clone(),
            to: self.to.clone(),
            rate: rate.value,
            amount_from: self.amount_from,
            amount_to: self.amount_to,
        });
    }

    // =========================================================================
    // Connectivity
    // =========================================================================

    /// React to a connectivity transition. Coming online re-hydrates the
    /// currency list when the in-memory set is empty; going offline only
    /// updates the indicator.
    pub async fn apply_connectivity(&mut self, online: bool) {
        self.online = online;
        self.view.set_connectivity(online);

        if online {
            self.view.show_notification(NOTICE_ONLINE);
            if self.currencies.is_empty() {
                self.hydrate_currencies().await;
            }
        } else {
            self.view.show_notification(NOTICE_OFFLINE);
        }
    }

    // =========================================================================
    // Offline conversions
    // =========================================================================

    /// Every conversion usable without connectivity, with the collection's
    /// age for display.
    pub fn offline_conversions(&self) -> (Vec<ConversionRate>, Option<String>) {
        (self.store.all_rates(), self.store.rates_age())
    }
}

// ============================================================================
// Tests
// ============================================================================
