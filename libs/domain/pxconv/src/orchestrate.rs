use anyhow::Context;
use chrono::{DateTime, Utc};
use pxdom::tree::{Document, NodeId};
use pxfx::Ccy;
use pxstore::KvBackend;
use strum::IntoEnumIterator;

use crate::{
    fetch::RateSource,
    prompt::{wait_until_ready, CurrencyPrompt, READY_POLL_ATTEMPTS, READY_POLL_INTERVAL},
    settings::{AppSettings, SettingsRepository},
};

/// Label of the injected change-currency control.
const CHANGE_CURRENCY_LABEL: &str = "Change Target Currency";

// -----------------------------------------------------------------------------
// StartupOutcome
// -----------------------------------------------------------------------------
/// What the host should do after startup resolved the settings.
#[derive(Debug, Clone, PartialEq)]
pub enum StartupOutcome {
    /// Settings are available; mutation batches can be rewritten with them.
    Ready(AppSettings),
    /// First-run setup persisted new settings; the host must reload the
    /// page so static content is converted synchronously on the next load.
    ReloadRequired,
}

// -----------------------------------------------------------------------------
// Orchestrator
// -----------------------------------------------------------------------------
/// Wires the settings repository, the rate source and the prompt together.
///
/// The host is expected to connect the document journal before calling
/// [`Orchestrator::startup`] so price nodes inserted during startup queue
/// up for the watcher rather than being missed.
pub struct Orchestrator<S, R, P> {
    settings: SettingsRepository<S>,
    rates: R,
    prompt: P,
    menu_control: Option<NodeId>,
}

impl<S, R, P> Orchestrator<S, R, P>
where
    S: KvBackend,
    R: RateSource,
    P: CurrencyPrompt,
{
    pub fn new(backend: S, rates: R, prompt: P) -> Self {
        Self {
            settings: SettingsRepository::new(backend),
            rates,
            prompt,
            menu_control: None,
        }
    }

    /// The settings repository, for feeding the watcher its cached state.
    #[inline]
    pub fn settings(&mut self) -> &mut SettingsRepository<S> {
        &mut self.settings
    }

    /// Resolve the application settings for this page load.
    ///
    /// Existing fresh settings are used as-is. Stale settings trigger a
    /// rate refresh that is persisted in place; if every mirror fails the
    /// stale table keeps serving. Absent settings enter first-run setup:
    /// await the prompt, fetch rates for the chosen currency, persist, and
    /// request a reload.
    ///
    /// # Errors
    /// - The prompt never became available, was cancelled, or first-run
    ///   rate fetching/persisting failed.
    pub fn startup(&mut self, now: DateTime<Utc>) -> anyhow::Result<StartupOutcome> {
        if let Some(current) = self.settings.load().cloned() {
            if !current.is_stale(now) {
                return Ok(StartupOutcome::Ready(current));
            }
            log::info!("updating exchange rates");
            return match self.rates.fetch_rates(current.target_currency) {
                Ok(exchange_rates) => {
                    let refreshed = AppSettings {
                        exchange_rates,
                        last_update: now,
                        ..current
                    };
                    self.settings.store(refreshed.clone())?;
                    Ok(StartupOutcome::Ready(refreshed))
                }
                Err(err) => {
                    log::error!("rate refresh failed, keeping stale rates: {err}");
                    Ok(StartupOutcome::Ready(current))
                }
            };
        }

        self.first_run(now)
    }

    fn first_run(&mut self, now: DateTime<Utc>) -> anyhow::Result<StartupOutcome> {
        wait_until_ready(&self.prompt, READY_POLL_ATTEMPTS, READY_POLL_INTERVAL)?;
        let codes: Vec<Ccy> = Ccy::iter().collect();
        let chosen = self
            .prompt
            .choose(&codes)?
            .context("no currency code selected")?;

        let exchange_rates = self
            .rates
            .fetch_rates(chosen)
            .context("cannot fetch initial exchange rates")?;
        self.settings.store(AppSettings {
            target_currency: chosen,
            exchange_rates,
            last_update: now,
        })?;
        log::info!("refreshing page");
        Ok(StartupOutcome::ReloadRequired)
    }

    /// Drop the persisted settings and request a reload into first-run
    /// setup. Invoked by the injected change-currency control.
    pub fn change_currency(&mut self) -> StartupOutcome {
        self.settings.clear();
        log::info!("target currency cleared, reload into first-run setup");
        StartupOutcome::ReloadRequired
    }

    /// Inject the change-currency control into the discovered menu
    /// container, once per orchestrator.
    ///
    /// The journal is paused during the insertion so the watcher does not
    /// observe it. Returns the control node, or [None] when it is already
    /// in place.
    ///
    /// # Errors
    /// - `container` is not an element.
    pub fn on_menu_container(
        &mut self,
        doc: &mut Document,
        container: NodeId,
    ) -> anyhow::Result<Option<NodeId>> {
        if self.menu_control.is_some() {
            return Ok(None);
        }
        let control = doc.with_journal_paused(|doc| -> anyhow::Result<NodeId> {
            let control = doc.create_element("a");
            let data = doc.element_mut(control).expect("control is an element");
            data.classes.push("global_action_link".to_owned());
            let label = doc.create_text(CHANGE_CURRENCY_LABEL);
            doc.append_child(control, label)
                .expect("control accepts children");
            doc.prepend_child(container, control)?;
            Ok(control)
        })?;
        log::info!("injected change currency control");
        self.menu_control = Some(control);
        Ok(Some(control))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use pxfx::{ExchangeRate, RateTable};
    use pxstore::{encode_record, MemoryBackend};

    use crate::{
        fetch::FetchError,
        settings::SETTINGS_KEY,
        watch::{MutationWatcher, WatcherEvent, MENU_CONTAINER_ID},
    };

    use super::*;

    mockall::mock! {
        Rates {}

        impl RateSource for Rates {
            fn fetch_rates(&self, base: Ccy) -> Result<RateTable, FetchError>;
        }
    }

    mockall::mock! {
        Prompt {}

        impl CurrencyPrompt for Prompt {
            fn is_ready(&self) -> bool;
            fn choose(&mut self, codes: &[Ccy]) -> anyhow::Result<Option<Ccy>>;
        }
    }

    fn table() -> RateTable {
        RateTable::new(vec![ExchangeRate {
            code: Ccy::TRY,
            rate: 0.031,
        }])
    }

    /// Whole-millisecond timestamp so persisted copies compare equal.
    fn fixed_now() -> DateTime<Utc> {
        "2024-02-01T10:00:00Z".parse().unwrap()
    }

    fn stored_settings(backend: &mut MemoryBackend, last_update: DateTime<Utc>) -> AppSettings {
        let settings = AppSettings {
            target_currency: Ccy::USD,
            exchange_rates: table(),
            last_update,
        };
        backend.set(SETTINGS_KEY, encode_record(&settings).unwrap());
        settings
    }

    #[test]
    fn test_fresh_settings_skip_refresh() {
        let now = fixed_now();
        let mut backend = MemoryBackend::new();
        let settings = stored_settings(&mut backend, now - TimeDelta::hours(1));
        let mut rates = MockRates::new();
        rates.expect_fetch_rates().times(0);

        let mut orch = Orchestrator::new(backend, rates, MockPrompt::new());
        let outcome = orch.startup(now).unwrap();

        assert_eq!(outcome, StartupOutcome::Ready(settings));
    }

    #[test]
    fn test_stale_settings_refresh_and_persist() {
        let now = fixed_now();
        let mut backend = MemoryBackend::new();
        stored_settings(&mut backend, now - TimeDelta::hours(13));
        let fresh = RateTable::new(vec![ExchangeRate {
            code: Ccy::TRY,
            rate: 0.04,
        }]);
        let mut rates = MockRates::new();
        let returned = fresh.clone();
        rates
            .expect_fetch_rates()
            .times(1)
            .returning(move |_| Ok(returned.clone()));

        let mut orch = Orchestrator::new(backend, rates, MockPrompt::new());
        let outcome = orch.startup(now).unwrap();

        let StartupOutcome::Ready(settings) = outcome else {
            panic!("expected ready outcome");
        };
        assert_eq!(settings.exchange_rates, fresh);
        assert_eq!(settings.last_update, now);
        assert_eq!(orch.settings().load().unwrap().exchange_rates, fresh);
    }

    #[test]
    fn test_stale_settings_survive_full_mirror_failure() {
        let now = fixed_now();
        let mut backend = MemoryBackend::new();
        let stale = stored_settings(&mut backend, now - TimeDelta::hours(13));
        let mut rates = MockRates::new();
        rates
            .expect_fetch_rates()
            .times(1)
            .returning(|base| Err(FetchError::AllMirrorsFailed { base }));

        let mut orch = Orchestrator::new(backend, rates, MockPrompt::new());
        let outcome = orch.startup(now).unwrap();

        assert_eq!(outcome, StartupOutcome::Ready(stale));
    }

    #[test]
    fn test_first_run_prompts_fetches_persists_and_reloads() {
        let now = fixed_now();
        let mut rates = MockRates::new();
        rates
            .expect_fetch_rates()
            .times(1)
            .withf(|base| *base == Ccy::PLN)
            .returning(|_| Ok(RateTable::default()));
        let mut prompt = MockPrompt::new();
        prompt.expect_is_ready().return_const(true);
        prompt
            .expect_choose()
            .times(1)
            .returning(|_| Ok(Some(Ccy::PLN)));

        let mut orch = Orchestrator::new(MemoryBackend::new(), rates, prompt);
        let outcome = orch.startup(now).unwrap();

        assert_eq!(outcome, StartupOutcome::ReloadRequired);
        let persisted = orch.settings().load().unwrap();
        assert_eq!(persisted.target_currency, Ccy::PLN);
    }

    #[test]
    fn test_first_run_cancelled_fails_startup() {
        let mut prompt = MockPrompt::new();
        prompt.expect_is_ready().return_const(true);
        prompt.expect_choose().times(1).returning(|_| Ok(None));
        let mut rates = MockRates::new();
        rates.expect_fetch_rates().times(0);

        let mut orch = Orchestrator::new(MemoryBackend::new(), rates, prompt);
        let res = orch.startup(Utc::now());

        assert!(res.is_err());
    }

    #[test]
    fn test_change_currency_clears_settings() {
        let now = fixed_now();
        let mut backend = MemoryBackend::new();
        stored_settings(&mut backend, now);
        let mut orch = Orchestrator::new(backend, MockRates::new(), MockPrompt::new());

        let outcome = orch.change_currency();

        assert_eq!(outcome, StartupOutcome::ReloadRequired);
        assert!(orch.settings().load().is_none());
    }

    #[test]
    fn test_menu_container_injection_is_one_shot_and_unobserved() {
        let mut doc = Document::new();
        doc.connect();
        let menu = doc.create_element_with_id("div", MENU_CONTAINER_ID);
        doc.append_child(doc.root(), menu).unwrap();
        let mut watcher = MutationWatcher::new();
        let mut orch =
            Orchestrator::new(MemoryBackend::new(), MockRates::new(), MockPrompt::new());

        let batch = doc.take_batch();
        let events = watcher.process_batch(&mut doc, &batch, None);
        let [WatcherEvent::MenuContainerFound { target }] = events.as_slice() else {
            panic!("expected the menu signal");
        };

        let control = orch.on_menu_container(&mut doc, *target).unwrap().unwrap();
        assert_eq!(doc.text_content(control), CHANGE_CURRENCY_LABEL);
        assert_eq!(doc.node(menu).children().first(), Some(&control));
        assert!(doc.take_batch().is_empty());

        assert_eq!(orch.on_menu_container(&mut doc, *target).unwrap(), None);
    }
}
