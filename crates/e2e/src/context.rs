//! Per-test state: generated data, its ledger and super-user access
//!
//! A context lives for one scenario on one worker. Everything the scenario
//! creates through a checked requester, or registers from the UI, lands in
//! the context's ledger and is deleted by [`TestContext::finish`].

use tracing::{debug, info};

use buildprobe_api::{CheckedRequesters, ProbeConfig, RequestSpec, Requesters};
use buildprobe_common::model::User;
use buildprobe_common::{generate_all, CreationLedger, SharedLedger, TestData};

use crate::error::E2eResult;
use crate::pages::{LoginPage, UiSession};
use crate::playwright::{PlaywrightConfig, PlaywrightHandle};

pub struct TestContext {
    config: ProbeConfig,
    pub test_data: TestData,
    ledger: SharedLedger,
    super_user: CheckedRequesters,
    super_user_unchecked: Requesters,
}

impl TestContext {
    /// Generate fresh test data with an empty ledger
    pub fn begin(config: &ProbeConfig) -> E2eResult<Self> {
        let ledger = CreationLedger::shared();
        let spec = RequestSpec::super_user(config)?;
        let context = Self {
            config: config.clone(),
            test_data: generate_all()?,
            super_user: CheckedRequesters::new(spec.clone(), ledger.clone()),
            super_user_unchecked: Requesters::new(spec),
            ledger,
        };
        debug!(
            "Test data ready: project {}, user {}",
            context.test_data.project.id_str(),
            context.test_data.user.username_str()
        );
        Ok(context)
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    /// Status-checked super-user requesters; creates are recorded for cleanup
    pub fn super_user(&self) -> &CheckedRequesters {
        &self.super_user
    }

    pub fn super_user_unchecked(&self) -> &Requesters {
        &self.super_user_unchecked
    }

    /// Status-checked requesters authenticated as `user`, sharing this ledger
    pub fn checked_as(&self, user: &User) -> E2eResult<CheckedRequesters> {
        Ok(CheckedRequesters::new(
            RequestSpec::auth(&self.config, user)?,
            self.ledger.clone(),
        ))
    }

    pub fn unchecked_as(&self, user: &User) -> E2eResult<Requesters> {
        Ok(Requesters::new(RequestSpec::auth(&self.config, user)?))
    }

    pub fn unauth(&self) -> E2eResult<Requesters> {
        Ok(Requesters::new(RequestSpec::unauth(&self.config)?))
    }

    /// Replace the test data with a freshly generated set; the ledger is kept
    pub fn regenerate(&mut self) -> E2eResult<()> {
        self.test_data = generate_all()?;
        Ok(())
    }

    /// A second, independent data set for tests that need two of everything
    pub fn generate_more(&self) -> E2eResult<TestData> {
        Ok(generate_all()?)
    }

    pub fn ui_session(&self) -> E2eResult<UiSession> {
        let handle = PlaywrightHandle::new(PlaywrightConfig::from_probe(&self.config)?)?;
        UiSession::new(handle)
    }

    /// Create the test user through the API and queue a browser login as them
    pub async fn login_as(&self, session: &mut UiSession, user: &User) -> E2eResult<()> {
        self.super_user.users().create(user).await?;
        LoginPage::open(session).login(user);
        session.run().await?;
        info!("Logged in as {}", user.username_str());
        Ok(())
    }

    /// Delete everything this test created, whatever its outcome
    pub async fn finish(self) -> E2eResult<usize> {
        let deleted =
            buildprobe_common::drain_shared(&self.ledger, &self.super_user_unchecked).await?;
        debug!("Cleanup removed {} entities", deleted);
        Ok(deleted)
    }
}
