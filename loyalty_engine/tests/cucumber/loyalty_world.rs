use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use cucumber::World;
use log::*;
use loyalty_engine::{
    db_types::{AccountId, OrderNumber, SubmitOutcome, WithdrawalOutcome},
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    AccrualAuthority,
    AccrualError,
    AccrualReport,
    LedgerApi,
    LedgerError,
    OrderRegistryApi,
    ReconciliationApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct LoyaltyWorld {
    pub system: Option<LoyaltySystem>,
}

impl LoyaltyWorld {
    pub fn system(&self) -> &LoyaltySystem {
        self.system.as_ref().expect("System not initialised. Start the scenario with 'Given a fresh install'")
    }

    pub fn system_mut(&mut self) -> &mut LoyaltySystem {
        self.system.as_mut().expect("System not initialised. Start the scenario with 'Given a fresh install'")
    }
}

/// Stands in for the accrual authority. Orders without a scripted report are unknown to it.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAuthority {
    reports: Arc<Mutex<HashMap<String, AccrualReport>>>,
}

impl ScriptedAuthority {
    pub fn set_report(&self, report: AccrualReport) {
        self.reports.lock().expect("Poisoned lock").insert(report.order.clone(), report);
    }
}

impl AccrualAuthority for ScriptedAuthority {
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<AccrualReport, AccrualError> {
        let report = self.reports.lock().expect("Poisoned lock").get(number.as_str()).cloned();
        report.ok_or_else(|| AccrualError::NotRegistered(number.to_string()))
    }
}

#[derive(Debug)]
pub struct LoyaltySystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub authority: ScriptedAuthority,
    pub accounts: HashMap<String, AccountId>,
    pub last_submission: Option<SubmitOutcome>,
    pub last_withdrawal: Option<Result<WithdrawalOutcome, LedgerError>>,
}

impl LoyaltySystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        create_database(&db_path).await;
        let db = run_migrations(&db_path).await;
        debug!("Created database: {db_path}");
        Self {
            db_path,
            db,
            authority: ScriptedAuthority::default(),
            accounts: HashMap::new(),
            last_submission: None,
            last_withdrawal: None,
        }
    }

    pub fn registry(&self) -> OrderRegistryApi<SqliteDatabase> {
        OrderRegistryApi::new(self.db.clone())
    }

    pub fn ledger(&self) -> LedgerApi<SqliteDatabase> {
        LedgerApi::new(self.db.clone())
    }

    pub fn reconciler(&self) -> ReconciliationApi<SqliteDatabase, ScriptedAuthority> {
        ReconciliationApi::new(self.db.clone(), self.authority.clone())
    }

    pub fn account(&self, login: &str) -> AccountId {
        *self.accounts.get(login).unwrap_or_else(|| panic!("No customer called {login}"))
    }
}
