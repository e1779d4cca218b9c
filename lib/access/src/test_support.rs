//! In-memory fakes of the directory and session store for unit tests.

use crate::directory::{Page, ProviderOrg, ProviderTeam, ProviderUser, TeamDirectory};
use crate::error::{DirectoryError, StoreError};
use crate::session::{SessionData, SessionStore};
use async_trait::async_trait;
use rootcause::prelude::Report;
use std::collections::HashMap;
use std::sync::Mutex;
use teamgate_core::SessionId;

/// A directory serving canned pages and recording which pages were fetched.
#[derive(Debug, Default)]
pub struct FakeDirectory {
    login: Option<String>,
    team_pages: Vec<Vec<ProviderTeam>>,
    org_pages: Vec<Vec<ProviderOrg>>,
    fail_teams: bool,
    teams_fetched: Mutex<Vec<u32>>,
    orgs_fetched: Mutex<Vec<u32>>,
}

impl FakeDirectory {
    pub fn new(login: &str) -> Self {
        Self {
            login: Some(login.to_string()),
            ..Self::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_team_pages(mut self, pages: Vec<Vec<ProviderTeam>>) -> Self {
        self.team_pages = pages;
        self
    }

    pub fn with_org_pages(mut self, pages: Vec<Vec<ProviderOrg>>) -> Self {
        self.org_pages = pages;
        self
    }

    pub fn failing_teams(mut self) -> Self {
        self.fail_teams = true;
        self
    }

    pub fn team_pages_fetched(&self) -> Vec<u32> {
        self.teams_fetched.lock().expect("lock").clone()
    }

    pub fn org_pages_fetched(&self) -> Vec<u32> {
        self.orgs_fetched.lock().expect("lock").clone()
    }
}

fn page_of<T: Clone>(pages: &[Vec<T>], page: u32) -> Page<T> {
    let index = page.saturating_sub(1) as usize;
    let items = pages.get(index).cloned().unwrap_or_default();
    if index + 1 < pages.len() {
        Page::followed_by(items, page + 1)
    } else {
        Page::last(items)
    }
}

#[async_trait]
impl TeamDirectory for FakeDirectory {
    async fn current_user(&self) -> Result<ProviderUser, Report<DirectoryError>> {
        Ok(ProviderUser {
            login: self.login.clone(),
        })
    }

    async fn user_teams(&self, page: u32) -> Result<Page<ProviderTeam>, Report<DirectoryError>> {
        self.teams_fetched.lock().expect("lock").push(page);
        if self.fail_teams {
            return Err(DirectoryError::UnexpectedStatus {
                endpoint: "/user/teams".to_string(),
                status: 502,
            }
            .into());
        }
        Ok(page_of(&self.team_pages, page))
    }

    async fn user_orgs(&self, page: u32) -> Result<Page<ProviderOrg>, Report<DirectoryError>> {
        self.orgs_fetched.lock().expect("lock").push(page);
        Ok(page_of(&self.org_pages, page))
    }
}

/// A session store kept in a map, optionally failing every save.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<SessionId, SessionData>>,
    destroyed: Mutex<Vec<SessionId>>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_saves() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.lock().expect("lock").contains_key(id)
    }

    pub fn get(&self, id: &SessionId) -> Option<SessionData> {
        self.sessions.lock().expect("lock").get(id).cloned()
    }

    pub fn destroyed(&self) -> Vec<SessionId> {
        let mut destroyed = self.destroyed.lock().expect("lock").clone();
        destroyed.sort();
        destroyed
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>, Report<StoreError>> {
        Ok(self.get(id))
    }

    async fn save(&self, session: &SessionData) -> Result<(), Report<StoreError>> {
        if self.fail_saves {
            return Err(StoreError::Unavailable {
                details: "disk full".to_string(),
            }
            .into());
        }
        self.sessions
            .lock()
            .expect("lock")
            .insert(session.id().clone(), session.clone());
        Ok(())
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), Report<StoreError>> {
        self.sessions.lock().expect("lock").remove(id);
        self.destroyed.lock().expect("lock").push(id.clone());
        Ok(())
    }
}
