//! # Demo Data
//!
//! A small organization for local development: one administrator, two
//! department managers, two team leads and four engineers, arranged into
//! an Engineering and a Sales department with two Engineering teams.

use crate::{
    AuthProvider, Department, DepartmentId, OkrError, Role, Team, TeamId, Tracker, User, UserId,
};
use crate::storage::Batch;
use chrono::Utc;
use serde::Serialize;

/// (name, email, role)
const DEMO_USERS: [(&str, &str, Role); 9] = [
    ("Admin User", "admin@example.com", Role::Admin),
    ("Engineering Manager", "eng.manager@example.com", Role::Manager),
    ("Sales Manager", "sales.manager@example.com", Role::Manager),
    ("Frontend Lead", "frontend.lead@example.com", Role::TeamLead),
    ("Backend Lead", "backend.lead@example.com", Role::TeamLead),
    ("Frontend Dev 1", "frontend1@example.com", Role::Individual),
    ("Frontend Dev 2", "frontend2@example.com", Role::Individual),
    ("Backend Dev 1", "backend1@example.com", Role::Individual),
    ("Backend Dev 2", "backend2@example.com", Role::Individual),
];

/// What [`Tracker::seed_demo_data`] created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub users: Vec<UserId>,
    pub departments: Vec<DepartmentId>,
    pub teams: Vec<TeamId>,
}

impl Tracker {
    /// Wipe every collection and load the demo organization.
    pub fn seed_demo_data(&mut self) -> Result<SeedSummary, OkrError> {
        let now = Utc::now();
        let store = self.store_mut();
        store.clear()?;

        let mut users: Vec<User> = Vec::with_capacity(DEMO_USERS.len());
        for (index, (name, email, role)) in DEMO_USERS.iter().enumerate() {
            users.push(User {
                id: UserId(store.allocate_id()),
                name: (*name).to_string(),
                email: (*email).to_string(),
                role: *role,
                is_admin: *role == Role::Admin,
                department: None,
                team: None,
                auth_provider: AuthProvider::Github,
                github_id: Some(format!("github_{}", index + 1)),
                github_access_token: None,
                okta_id: None,
                last_login: now,
                is_active: true,
                created_at: now,
                updated_at: now,
            });
        }
        let uid = |i: usize| users[i].id;

        let engineering = Department {
            id: DepartmentId(store.allocate_id()),
            name: "Engineering".to_string(),
            description: Some("Software Development Department".to_string()),
            manager: Some(uid(1)),
        };
        let sales = Department {
            id: DepartmentId(store.allocate_id()),
            name: "Sales".to_string(),
            description: Some("Sales and Business Development".to_string()),
            manager: Some(uid(2)),
        };

        let frontend = Team {
            id: TeamId(store.allocate_id()),
            name: "Frontend Team".to_string(),
            department: engineering.id,
            team_lead: Some(uid(3)),
            members: vec![uid(5), uid(6)],
        };
        let backend = Team {
            id: TeamId(store.allocate_id()),
            name: "Backend Team".to_string(),
            department: engineering.id,
            team_lead: Some(uid(4)),
            members: vec![uid(7), uid(8)],
        };

        for index in [1, 3, 4, 5, 6, 7, 8] {
            users[index].department = Some(engineering.id);
        }
        users[2].department = Some(sales.id);
        for index in [3, 5, 6] {
            users[index].team = Some(frontend.id);
        }
        for index in [4, 7, 8] {
            users[index].team = Some(backend.id);
        }

        let mut batch = Batch::new();
        for user in &users {
            batch.put(user)?;
        }
        batch.put(&engineering)?;
        batch.put(&sales)?;
        batch.put(&frontend)?;
        batch.put(&backend)?;
        store.commit(batch)?;

        let summary = SeedSummary {
            users: users.iter().map(|u| u.id).collect(),
            departments: vec![engineering.id, sales.id],
            teams: vec![frontend.id, backend.id],
        };
        tracing::info!(
            users = summary.users.len(),
            departments = summary.departments.len(),
            teams = summary.teams.len(),
            "demo data seeded"
        );
        Ok(summary)
    }
}
