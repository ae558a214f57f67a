use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

use super::schema::SCHEMA;
use super::{Store, TicketPosition};
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

const FIRM_COLS: &str = "id, name, company_email, company_phone, white_label, address, city, \
     zip_code, state, country, logo, customer_id, goal, created_at, updated_at";

fn map_firm(row: &Row<'_>) -> rusqlite::Result<Firm> {
    Ok(Firm {
        id: row.get(0)?,
        name: row.get(1)?,
        company_email: row.get(2)?,
        company_phone: row.get(3)?,
        white_label: row.get(4)?,
        address: row.get(5)?,
        city: row.get(6)?,
        zip_code: row.get(7)?,
        state: row.get(8)?,
        country: row.get(9)?,
        logo: row.get(10)?,
        customer_id: row.get(11)?,
        goal: row.get(12)?,
        created_at: parse_datetime(&row.get::<_, String>(13)?),
        updated_at: parse_datetime(&row.get::<_, String>(14)?),
    })
}

const SUB_SIDIARY_COLS: &str = "id, firm_id, name, company_email, company_phone, address, city, \
     zip_code, state, country, logo, connect_account_id, created_at, updated_at";

fn map_sub_sidiary(row: &Row<'_>) -> rusqlite::Result<SubSidiary> {
    Ok(SubSidiary {
        id: row.get(0)?,
        firm_id: row.get(1)?,
        name: row.get(2)?,
        company_email: row.get(3)?,
        company_phone: row.get(4)?,
        address: row.get(5)?,
        city: row.get(6)?,
        zip_code: row.get(7)?,
        state: row.get(8)?,
        country: row.get(9)?,
        logo: row.get(10)?,
        connect_account_id: row.get(11)?,
        created_at: parse_datetime(&row.get::<_, String>(12)?),
        updated_at: parse_datetime(&row.get::<_, String>(13)?),
    })
}

const USER_COLS: &str = "id, email, name, avatar_url, role, firm_id, created_at, updated_at";

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        avatar_url: row.get(3)?,
        role: Role::parse(&row.get::<_, String>(4)?).unwrap_or_default(),
        firm_id: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

const STAGE_COLS: &str = "id, sub_sidiary_id, name, created_at, updated_at";

fn map_stage(row: &Row<'_>) -> rusqlite::Result<Stage> {
    Ok(Stage {
        id: row.get(0)?,
        sub_sidiary_id: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        updated_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

const LANE_COLS: &str = "id, stage_id, name, \"order\", created_at, updated_at";

fn map_lane(row: &Row<'_>) -> rusqlite::Result<Lane> {
    Ok(Lane {
        id: row.get(0)?,
        stage_id: row.get(1)?,
        name: row.get(2)?,
        order: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

const TICKET_COLS: &str = "id, lane_id, name, description, value, \"order\", assigned_user_id, \
     customer_id, created_at, updated_at";

fn map_ticket(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: row.get(0)?,
        lane_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        value: row.get(4)?,
        order: row.get(5)?,
        assigned_user_id: row.get(6)?,
        customer_id: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
        updated_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

fn map_tag(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        sub_sidiary_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn map_contact(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        sub_sidiary_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn map_media(row: &Row<'_>) -> rusqlite::Result<Media> {
    Ok(Media {
        id: row.get(0)?,
        sub_sidiary_id: row.get(1)?,
        name: row.get(2)?,
        link: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

const CAMPAIGN_COLS: &str = "id, sub_sidiary_id, name, description, sub_domain_name, favicon, \
     published, live_products, created_at, updated_at";

fn map_campaign(row: &Row<'_>) -> rusqlite::Result<Campaign> {
    Ok(Campaign {
        id: row.get(0)?,
        sub_sidiary_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        sub_domain_name: row.get(4)?,
        favicon: row.get(5)?,
        published: row.get(6)?,
        live_products: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
        updated_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

const PAGE_COLS: &str =
    "id, campaign_id, name, path_name, \"order\", visits, content, created_at, updated_at";

fn map_campaign_page(row: &Row<'_>) -> rusqlite::Result<CampaignPage> {
    Ok(CampaignPage {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        name: row.get(2)?,
        path_name: row.get(3)?,
        order: row.get(4)?,
        visits: row.get(5)?,
        content: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn map_token(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        is_admin: row.get(3)?,
        user_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        expires_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(7)?.map(|s| parse_datetime(&s)),
    })
}

/// Deletes everything scoped under one subsidiary, children first.
/// Must run inside an open transaction.
fn cascade_sub_sidiary(tx: &Transaction<'_>, id: &str) -> Result<usize> {
    tx.execute(
        "DELETE FROM ticket_tags WHERE ticket_id IN (
             SELECT t.id FROM tickets t
             JOIN lanes l ON t.lane_id = l.id
             JOIN stages s ON l.stage_id = s.id
             WHERE s.sub_sidiary_id = ?1)",
        params![id],
    )?;
    tx.execute(
        "DELETE FROM tickets WHERE lane_id IN (
             SELECT l.id FROM lanes l
             JOIN stages s ON l.stage_id = s.id
             WHERE s.sub_sidiary_id = ?1)",
        params![id],
    )?;
    tx.execute(
        "DELETE FROM lanes WHERE stage_id IN (SELECT id FROM stages WHERE sub_sidiary_id = ?1)",
        params![id],
    )?;
    tx.execute("DELETE FROM stages WHERE sub_sidiary_id = ?1", params![id])?;
    tx.execute(
        "DELETE FROM campaign_pages WHERE campaign_id IN (
             SELECT id FROM campaigns WHERE sub_sidiary_id = ?1)",
        params![id],
    )?;
    tx.execute(
        "DELETE FROM campaigns WHERE sub_sidiary_id = ?1",
        params![id],
    )?;
    tx.execute(
        "DELETE FROM contacts WHERE sub_sidiary_id = ?1",
        params![id],
    )?;
    tx.execute("DELETE FROM tags WHERE sub_sidiary_id = ?1", params![id])?;
    tx.execute("DELETE FROM media WHERE sub_sidiary_id = ?1", params![id])?;
    tx.execute(
        "DELETE FROM permissions WHERE sub_sidiary_id = ?1",
        params![id],
    )?;
    tx.execute(
        "DELETE FROM sidebar_options WHERE sub_sidiary_id = ?1",
        params![id],
    )?;
    tx.execute(
        "DELETE FROM notifications WHERE sub_sidiary_id = ?1",
        params![id],
    )?;
    let rows = tx.execute("DELETE FROM sub_sidiaries WHERE id = ?1", params![id])?;
    Ok(rows)
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // Firm operations

    fn upsert_firm(&self, firm: &Firm) -> Result<()> {
        self.conn().execute(
            "INSERT INTO firms (id, name, company_email, company_phone, white_label, address, \
             city, zip_code, state, country, logo, customer_id, goal, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                company_email = excluded.company_email,
                company_phone = excluded.company_phone,
                white_label = excluded.white_label,
                address = excluded.address,
                city = excluded.city,
                zip_code = excluded.zip_code,
                state = excluded.state,
                country = excluded.country,
                logo = excluded.logo,
                customer_id = excluded.customer_id,
                goal = excluded.goal,
                updated_at = excluded.updated_at",
            params![
                firm.id,
                firm.name,
                firm.company_email,
                firm.company_phone,
                firm.white_label,
                firm.address,
                firm.city,
                firm.zip_code,
                firm.state,
                firm.country,
                firm.logo,
                firm.customer_id,
                firm.goal,
                format_datetime(&firm.created_at),
                format_datetime(&firm.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_firm(&self, id: &str) -> Result<Option<Firm>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {FIRM_COLS} FROM firms WHERE id = ?1"),
            params![id],
            map_firm,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_firm_by_customer_id(&self, customer_id: &str) -> Result<Option<Firm>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {FIRM_COLS} FROM firms WHERE customer_id = ?1"),
            params![customer_id],
            map_firm,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_firms(&self, cursor: &str, limit: i32) -> Result<Vec<Firm>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {FIRM_COLS} FROM firms WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], map_firm)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_firm(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let sub_ids: Vec<String> = {
            let mut stmt = tx.prepare("SELECT id FROM sub_sidiaries WHERE firm_id = ?1")?;
            let rows = stmt.query_map(params![id], |row| row.get(0))?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };

        for sub_id in &sub_ids {
            cascade_sub_sidiary(&tx, sub_id)?;
        }

        tx.execute("DELETE FROM notifications WHERE firm_id = ?1", params![id])?;
        tx.execute("DELETE FROM subscriptions WHERE firm_id = ?1", params![id])?;
        tx.execute("DELETE FROM invitations WHERE firm_id = ?1", params![id])?;
        tx.execute(
            "DELETE FROM sidebar_options WHERE firm_id = ?1",
            params![id],
        )?;
        tx.execute(
            "DELETE FROM tokens WHERE user_id IN (SELECT id FROM users WHERE firm_id = ?1)",
            params![id],
        )?;
        tx.execute("DELETE FROM users WHERE firm_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM firms WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // SubSidiary operations

    fn upsert_sub_sidiary(&self, sub: &SubSidiary) -> Result<()> {
        self.conn().execute(
            "INSERT INTO sub_sidiaries (id, firm_id, name, company_email, company_phone, \
             address, city, zip_code, state, country, logo, connect_account_id, created_at, \
             updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                company_email = excluded.company_email,
                company_phone = excluded.company_phone,
                address = excluded.address,
                city = excluded.city,
                zip_code = excluded.zip_code,
                state = excluded.state,
                country = excluded.country,
                logo = excluded.logo,
                connect_account_id = excluded.connect_account_id,
                updated_at = excluded.updated_at",
            params![
                sub.id,
                sub.firm_id,
                sub.name,
                sub.company_email,
                sub.company_phone,
                sub.address,
                sub.city,
                sub.zip_code,
                sub.state,
                sub.country,
                sub.logo,
                sub.connect_account_id,
                format_datetime(&sub.created_at),
                format_datetime(&sub.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_sub_sidiary(&self, id: &str) -> Result<Option<SubSidiary>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SUB_SIDIARY_COLS} FROM sub_sidiaries WHERE id = ?1"),
            params![id],
            map_sub_sidiary,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_firm_sub_sidiaries(&self, firm_id: &str) -> Result<Vec<SubSidiary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SUB_SIDIARY_COLS} FROM sub_sidiaries WHERE firm_id = ?1 ORDER BY name"
        ))?;

        let rows = stmt.query_map(params![firm_id], map_sub_sidiary)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_sub_sidiary(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let rows = cascade_sub_sidiary(&tx, id)?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO users (id, email, name, avatar_url, role, firm_id, created_at, \
             updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id,
                user.email,
                user.name,
                user.avatar_url,
                user.role.as_str(),
                user.firm_id,
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::AlreadyExists)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
            params![id],
            map_user,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE email = ?1"),
            params![email],
            map_user,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET name = ?1, avatar_url = ?2, role = ?3, firm_id = ?4, \
             updated_at = ?5 WHERE email = ?6",
            params![
                user.name,
                user.avatar_url,
                user.role.as_str(),
                user.firm_id,
                format_datetime(&Utc::now()),
                user.email,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_user(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let email: Option<String> = tx
            .query_row(
                "SELECT email FROM users WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(email) = email else {
            return Ok(false);
        };

        tx.execute(
            "UPDATE tickets SET assigned_user_id = NULL WHERE assigned_user_id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM tokens WHERE user_id = ?1", params![id])?;
        tx.execute("DELETE FROM permissions WHERE email = ?1", params![email])?;
        tx.execute("DELETE FROM notifications WHERE user_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    fn list_firm_users(&self, firm_id: &str) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLS} FROM users WHERE firm_id = ?1 ORDER BY name"
        ))?;

        let rows = stmt.query_map(params![firm_id], map_user)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn find_user_for_sub_sidiary(&self, sub_sidiary_id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT u.id, u.email, u.name, u.avatar_url, u.role, u.firm_id, u.created_at, \
             u.updated_at
             FROM users u
             JOIN sub_sidiaries s ON u.firm_id = s.firm_id
             WHERE s.id = ?1
             LIMIT 1",
            params![sub_sidiary_id],
            map_user,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_sub_sidiary_team_members(&self, sub_sidiary_id: &str) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.email, u.name, u.avatar_url, u.role, u.firm_id, u.created_at, \
             u.updated_at
             FROM users u
             JOIN sub_sidiaries s ON u.firm_id = s.firm_id
             JOIN permissions p ON p.email = u.email AND p.sub_sidiary_id = s.id
             WHERE s.id = ?1 AND u.role = 'SUBSIDIARY_USER' AND p.access = 1
             ORDER BY u.name",
        )?;

        let rows = stmt.query_map(params![sub_sidiary_id], map_user)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Permission operations

    fn upsert_permission(&self, permission: &Permission) -> Result<()> {
        self.conn().execute(
            "INSERT INTO permissions (id, email, sub_sidiary_id, access)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (email, sub_sidiary_id) DO UPDATE SET
                access = excluded.access",
            params![
                permission.id,
                permission.email,
                permission.sub_sidiary_id,
                permission.access,
            ],
        )?;
        Ok(())
    }

    fn get_permission(&self, email: &str, sub_sidiary_id: &str) -> Result<Option<Permission>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, email, sub_sidiary_id, access
             FROM permissions WHERE email = ?1 AND sub_sidiary_id = ?2",
            params![email, sub_sidiary_id],
            |row| {
                Ok(Permission {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    sub_sidiary_id: row.get(2)?,
                    access: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_user_permissions(&self, email: &str) -> Result<Vec<PermissionWithSubSidiary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT p.id, p.email, p.sub_sidiary_id, p.access, \
             s.id, s.firm_id, s.name, s.company_email, s.company_phone, s.address, s.city, \
             s.zip_code, s.state, s.country, s.logo, s.connect_account_id, s.created_at, \
             s.updated_at
             FROM permissions p
             JOIN sub_sidiaries s ON p.sub_sidiary_id = s.id
             WHERE p.email = ?1
             ORDER BY s.name",
        )?;

        let rows = stmt.query_map(params![email], |row| {
            Ok(PermissionWithSubSidiary {
                permission: Permission {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    sub_sidiary_id: row.get(2)?,
                    access: row.get(3)?,
                },
                sub_sidiary: SubSidiary {
                    id: row.get(4)?,
                    firm_id: row.get(5)?,
                    name: row.get(6)?,
                    company_email: row.get(7)?,
                    company_phone: row.get(8)?,
                    address: row.get(9)?,
                    city: row.get(10)?,
                    zip_code: row.get(11)?,
                    state: row.get(12)?,
                    country: row.get(13)?,
                    logo: row.get(14)?,
                    connect_account_id: row.get(15)?,
                    created_at: parse_datetime(&row.get::<_, String>(16)?),
                    updated_at: parse_datetime(&row.get::<_, String>(17)?),
                },
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Invitation operations

    fn create_invitation(&self, invitation: &Invitation) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO invitations (id, email, firm_id, role, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                invitation.id,
                invitation.email,
                invitation.firm_id,
                invitation.role.as_str(),
                invitation.status.as_str(),
                format_datetime(&invitation.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::AlreadyExists)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_pending_invitation(&self, email: &str) -> Result<Option<Invitation>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, email, firm_id, role, status, created_at
             FROM invitations WHERE email = ?1 AND status = 'PENDING'",
            params![email],
            |row| {
                Ok(Invitation {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    firm_id: row.get(2)?,
                    role: Role::parse(&row.get::<_, String>(3)?).unwrap_or_default(),
                    status: InvitationStatus::parse(&row.get::<_, String>(4)?)
                        .unwrap_or(InvitationStatus::Pending),
                    created_at: parse_datetime(&row.get::<_, String>(5)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_invitation(&self, email: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM invitations WHERE email = ?1", params![email])?;
        Ok(rows > 0)
    }

    // Stage operations

    fn upsert_stage(&self, stage: &Stage) -> Result<()> {
        self.conn().execute(
            "INSERT INTO stages (id, sub_sidiary_id, name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                updated_at = excluded.updated_at",
            params![
                stage.id,
                stage.sub_sidiary_id,
                stage.name,
                format_datetime(&stage.created_at),
                format_datetime(&stage.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_stage(&self, id: &str) -> Result<Option<Stage>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {STAGE_COLS} FROM stages WHERE id = ?1"),
            params![id],
            map_stage,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_sub_sidiary_stages(&self, sub_sidiary_id: &str) -> Result<Vec<Stage>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {STAGE_COLS} FROM stages WHERE sub_sidiary_id = ?1 ORDER BY created_at"
        ))?;

        let rows = stmt.query_map(params![sub_sidiary_id], map_stage)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_stage(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM ticket_tags WHERE ticket_id IN (
                 SELECT t.id FROM tickets t
                 JOIN lanes l ON t.lane_id = l.id
                 WHERE l.stage_id = ?1)",
            params![id],
        )?;
        tx.execute(
            "DELETE FROM tickets WHERE lane_id IN (SELECT id FROM lanes WHERE stage_id = ?1)",
            params![id],
        )?;
        tx.execute("DELETE FROM lanes WHERE stage_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM stages WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Lane operations

    fn append_lane(&self, lane: &Lane) -> Result<Lane> {
        let conn = self.conn();

        // Order is computed inside the INSERT so two appends to the same
        // stage can never read the same sibling count.
        conn.execute(
            "INSERT INTO lanes (id, stage_id, name, \"order\", created_at, updated_at)
             VALUES (?1, ?2, ?3, (SELECT COUNT(*) FROM lanes WHERE stage_id = ?2), ?4, ?5)",
            params![
                lane.id,
                lane.stage_id,
                lane.name,
                format_datetime(&lane.created_at),
                format_datetime(&lane.updated_at),
            ],
        )?;

        conn.query_row(
            &format!("SELECT {LANE_COLS} FROM lanes WHERE id = ?1"),
            params![lane.id],
            map_lane,
        )
        .map_err(Error::from)
    }

    fn upsert_lane(&self, lane: &Lane) -> Result<()> {
        self.conn().execute(
            "INSERT INTO lanes (id, stage_id, name, \"order\", created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                \"order\" = excluded.\"order\",
                updated_at = excluded.updated_at",
            params![
                lane.id,
                lane.stage_id,
                lane.name,
                lane.order,
                format_datetime(&lane.created_at),
                format_datetime(&lane.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_lane(&self, id: &str) -> Result<Option<Lane>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {LANE_COLS} FROM lanes WHERE id = ?1"),
            params![id],
            map_lane,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_stage_lanes(&self, stage_id: &str) -> Result<Vec<Lane>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {LANE_COLS} FROM lanes WHERE stage_id = ?1 ORDER BY \"order\""
        ))?;

        let rows = stmt.query_map(params![stage_id], map_lane)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_lane(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM ticket_tags WHERE ticket_id IN (
                 SELECT id FROM tickets WHERE lane_id = ?1)",
            params![id],
        )?;
        tx.execute("DELETE FROM tickets WHERE lane_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM lanes WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    fn reorder_lanes(&self, stage_id: &str, lane_ids: &[String]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let current: HashSet<String> = {
            let mut stmt = tx.prepare("SELECT id FROM lanes WHERE stage_id = ?1")?;
            let rows = stmt.query_map(params![stage_id], |row| row.get(0))?;
            rows.collect::<std::result::Result<HashSet<_>, _>>()?
        };

        let supplied: HashSet<&str> = lane_ids.iter().map(String::as_str).collect();
        if supplied.len() != lane_ids.len()
            || current.len() != lane_ids.len()
            || !current.iter().all(|id| supplied.contains(id.as_str()))
        {
            return Err(Error::Conflict(
                "reorder list must be a permutation of the stage's lanes".to_string(),
            ));
        }

        let now = format_datetime(&Utc::now());
        for (index, lane_id) in lane_ids.iter().enumerate() {
            tx.execute(
                "UPDATE lanes SET \"order\" = ?1, updated_at = ?2 WHERE id = ?3",
                params![index as i64, now, lane_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    // Ticket operations

    fn append_ticket(&self, ticket: &Ticket, tag_ids: &[String]) -> Result<Ticket> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO tickets (id, lane_id, name, description, value, \"order\", \
             assigned_user_id, customer_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, \
             (SELECT COUNT(*) FROM tickets WHERE lane_id = ?2), ?6, ?7, ?8, ?9)",
            params![
                ticket.id,
                ticket.lane_id,
                ticket.name,
                ticket.description,
                ticket.value,
                ticket.assigned_user_id,
                ticket.customer_id,
                format_datetime(&ticket.created_at),
                format_datetime(&ticket.updated_at),
            ],
        )?;

        for tag_id in tag_ids {
            tx.execute(
                "INSERT OR IGNORE INTO ticket_tags (ticket_id, tag_id) VALUES (?1, ?2)",
                params![ticket.id, tag_id],
            )?;
        }

        let created = tx.query_row(
            &format!("SELECT {TICKET_COLS} FROM tickets WHERE id = ?1"),
            params![ticket.id],
            map_ticket,
        )?;

        tx.commit()?;
        Ok(created)
    }

    fn upsert_ticket(&self, ticket: &Ticket, tag_ids: &[String]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO tickets (id, lane_id, name, description, value, \"order\", \
             assigned_user_id, customer_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT (id) DO UPDATE SET
                lane_id = excluded.lane_id,
                name = excluded.name,
                description = excluded.description,
                value = excluded.value,
                \"order\" = excluded.\"order\",
                assigned_user_id = excluded.assigned_user_id,
                customer_id = excluded.customer_id,
                updated_at = excluded.updated_at",
            params![
                ticket.id,
                ticket.lane_id,
                ticket.name,
                ticket.description,
                ticket.value,
                ticket.order,
                ticket.assigned_user_id,
                ticket.customer_id,
                format_datetime(&ticket.created_at),
                format_datetime(&ticket.updated_at),
            ],
        )?;

        tx.execute(
            "DELETE FROM ticket_tags WHERE ticket_id = ?1",
            params![ticket.id],
        )?;
        for tag_id in tag_ids {
            tx.execute(
                "INSERT INTO ticket_tags (ticket_id, tag_id) VALUES (?1, ?2)",
                params![ticket.id, tag_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_ticket(&self, id: &str) -> Result<Option<Ticket>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TICKET_COLS} FROM tickets WHERE id = ?1"),
            params![id],
            map_ticket,
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_ticket(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM ticket_tags WHERE ticket_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM tickets WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    fn reorder_tickets(&self, positions: &[TicketPosition]) -> Result<()> {
        if positions.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        // Every lane touched by the batch, whether as source or destination.
        let mut affected_lanes: HashSet<String> = HashSet::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for pos in positions {
            if !seen.insert(pos.ticket_id.as_str()) {
                return Err(Error::Conflict(format!(
                    "ticket {} appears twice in reorder batch",
                    pos.ticket_id
                )));
            }
            let current_lane: Option<String> = tx
                .query_row(
                    "SELECT lane_id FROM tickets WHERE id = ?1",
                    params![pos.ticket_id],
                    |row| row.get(0),
                )
                .optional()?;
            let current_lane = current_lane.ok_or(Error::NotFound)?;
            affected_lanes.insert(current_lane);
            affected_lanes.insert(pos.lane_id.clone());
        }

        // Each affected lane must be completely described by the batch:
        // a partial list would leave the dense-order invariant broken.
        let mut by_lane: HashMap<&str, Vec<i64>> = HashMap::new();
        for pos in positions {
            by_lane.entry(pos.lane_id.as_str()).or_default().push(pos.order);
        }

        for lane_id in &affected_lanes {
            let current: Vec<String> = {
                let mut stmt = tx.prepare("SELECT id FROM tickets WHERE lane_id = ?1")?;
                let rows = stmt.query_map(params![lane_id], |row| row.get(0))?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            };
            for ticket_id in &current {
                if !seen.contains(ticket_id.as_str()) {
                    return Err(Error::Conflict(format!(
                        "reorder batch is missing ticket {ticket_id} from an affected lane"
                    )));
                }
            }

            let mut orders = by_lane.remove(lane_id.as_str()).unwrap_or_default();
            orders.sort_unstable();
            if orders.iter().enumerate().any(|(i, o)| *o != i as i64) {
                return Err(Error::Conflict(format!(
                    "orders for lane {lane_id} are not a dense 0-based sequence"
                )));
            }
        }

        let now = format_datetime(&Utc::now());
        for pos in positions {
            tx.execute(
                "UPDATE tickets SET lane_id = ?1, \"order\" = ?2, updated_at = ?3 WHERE id = ?4",
                params![pos.lane_id, pos.order, now, pos.ticket_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn set_ticket_tags(&self, ticket_id: &str, tag_ids: &[String]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM ticket_tags WHERE ticket_id = ?1",
            params![ticket_id],
        )?;
        for tag_id in tag_ids {
            tx.execute(
                "INSERT INTO ticket_tags (ticket_id, tag_id) VALUES (?1, ?2)",
                params![ticket_id, tag_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn list_ticket_tags(&self, ticket_id: &str) -> Result<Vec<Tag>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.sub_sidiary_id, t.name, t.color, t.created_at
             FROM tags t
             JOIN ticket_tags tt ON t.id = tt.tag_id
             WHERE tt.ticket_id = ?1
             ORDER BY t.name",
        )?;

        let rows = stmt.query_map(params![ticket_id], map_tag)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Board read model

    fn list_lanes_with_tickets(&self, stage_id: &str) -> Result<Vec<LaneDetail>> {
        let conn = self.conn();

        let lanes: Vec<Lane> = {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LANE_COLS} FROM lanes WHERE stage_id = ?1 ORDER BY \"order\""
            ))?;
            let rows = stmt.query_map(params![stage_id], map_lane)?;
            rows.collect::<std::result::Result<Vec<_>, _>>()?
        };

        let mut details = Vec::with_capacity(lanes.len());
        for lane in lanes {
            let tickets: Vec<Ticket> = {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {TICKET_COLS} FROM tickets WHERE lane_id = ?1 ORDER BY \"order\""
                ))?;
                let rows = stmt.query_map(params![lane.id], map_ticket)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            };

            let mut expanded = Vec::with_capacity(tickets.len());
            for ticket in tickets {
                let tags: Vec<Tag> = {
                    let mut stmt = conn.prepare(
                        "SELECT t.id, t.sub_sidiary_id, t.name, t.color, t.created_at
                         FROM tags t
                         JOIN ticket_tags tt ON t.id = tt.tag_id
                         WHERE tt.ticket_id = ?1
                         ORDER BY t.name",
                    )?;
                    let rows = stmt.query_map(params![ticket.id], map_tag)?;
                    rows.collect::<std::result::Result<Vec<_>, _>>()?
                };

                let assigned = match &ticket.assigned_user_id {
                    Some(user_id) => conn
                        .query_row(
                            &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
                            params![user_id],
                            map_user,
                        )
                        .optional()?,
                    None => None,
                };

                let customer = match &ticket.customer_id {
                    Some(contact_id) => conn
                        .query_row(
                            "SELECT id, sub_sidiary_id, name, email, created_at
                             FROM contacts WHERE id = ?1",
                            params![contact_id],
                            map_contact,
                        )
                        .optional()?,
                    None => None,
                };

                expanded.push(TicketWithRelations {
                    ticket,
                    tags,
                    assigned,
                    customer,
                });
            }

            details.push(LaneDetail {
                lane,
                tickets: expanded,
            });
        }

        Ok(details)
    }

    // Tag operations

    fn upsert_tag(&self, tag: &Tag) -> Result<()> {
        self.conn().execute(
            "INSERT INTO tags (id, sub_sidiary_id, name, color, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                color = excluded.color",
            params![
                tag.id,
                tag.sub_sidiary_id,
                tag.name,
                tag.color,
                format_datetime(&tag.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_tag(&self, id: &str) -> Result<Option<Tag>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, sub_sidiary_id, name, color, created_at FROM tags WHERE id = ?1",
            params![id],
            map_tag,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_sub_sidiary_tags(&self, sub_sidiary_id: &str) -> Result<Vec<Tag>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, sub_sidiary_id, name, color, created_at
             FROM tags WHERE sub_sidiary_id = ?1 ORDER BY name",
        )?;

        let rows = stmt.query_map(params![sub_sidiary_id], map_tag)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_tag(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM ticket_tags WHERE tag_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM tags WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Contact operations

    fn upsert_contact(&self, contact: &Contact) -> Result<()> {
        self.conn().execute(
            "INSERT INTO contacts (id, sub_sidiary_id, name, email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email",
            params![
                contact.id,
                contact.sub_sidiary_id,
                contact.name,
                contact.email,
                format_datetime(&contact.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_contact(&self, id: &str) -> Result<Option<Contact>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, sub_sidiary_id, name, email, created_at FROM contacts WHERE id = ?1",
            params![id],
            map_contact,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_sub_sidiary_contacts(&self, sub_sidiary_id: &str) -> Result<Vec<Contact>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, sub_sidiary_id, name, email, created_at
             FROM contacts WHERE sub_sidiary_id = ?1 ORDER BY name",
        )?;

        let rows = stmt.query_map(params![sub_sidiary_id], map_contact)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn search_contacts(&self, sub_sidiary_id: &str, term: &str) -> Result<Vec<Contact>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, sub_sidiary_id, name, email, created_at
             FROM contacts WHERE sub_sidiary_id = ?1 AND name LIKE ?2 ORDER BY name",
        )?;

        let pattern = format!("%{term}%");
        let rows = stmt.query_map(params![sub_sidiary_id, pattern], map_contact)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_contact(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE tickets SET customer_id = NULL WHERE customer_id = ?1",
            params![id],
        )?;
        let rows = tx.execute("DELETE FROM contacts WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Media operations

    fn create_media(&self, media: &Media) -> Result<()> {
        self.conn().execute(
            "INSERT INTO media (id, sub_sidiary_id, name, link, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                media.id,
                media.sub_sidiary_id,
                media.name,
                media.link,
                format_datetime(&media.created_at),
            ],
        )?;
        Ok(())
    }

    fn get_media(&self, id: &str) -> Result<Option<Media>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, sub_sidiary_id, name, link, created_at FROM media WHERE id = ?1",
            params![id],
            map_media,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_sub_sidiary_media(&self, sub_sidiary_id: &str) -> Result<Vec<Media>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, sub_sidiary_id, name, link, created_at
             FROM media WHERE sub_sidiary_id = ?1 ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![sub_sidiary_id], map_media)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_media(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM media WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Notification operations

    fn create_notification(&self, notification: &Notification) -> Result<()> {
        self.conn().execute(
            "INSERT INTO notifications (id, notification, firm_id, sub_sidiary_id, user_id, \
             created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                notification.id,
                notification.notification,
                notification.firm_id,
                notification.sub_sidiary_id,
                notification.user_id,
                format_datetime(&notification.created_at),
            ],
        )?;
        Ok(())
    }

    fn list_firm_notifications(&self, firm_id: &str) -> Result<Vec<NotificationWithUser>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT n.id, n.notification, n.firm_id, n.sub_sidiary_id, n.user_id, n.created_at, \
             u.id, u.email, u.name, u.avatar_url, u.role, u.firm_id, u.created_at, u.updated_at
             FROM notifications n
             JOIN users u ON n.user_id = u.id
             WHERE n.firm_id = ?1
             ORDER BY n.created_at DESC",
        )?;

        let rows = stmt.query_map(params![firm_id], |row| {
            Ok(NotificationWithUser {
                notification: Notification {
                    id: row.get(0)?,
                    notification: row.get(1)?,
                    firm_id: row.get(2)?,
                    sub_sidiary_id: row.get(3)?,
                    user_id: row.get(4)?,
                    created_at: parse_datetime(&row.get::<_, String>(5)?),
                },
                user: User {
                    id: row.get(6)?,
                    email: row.get(7)?,
                    name: row.get(8)?,
                    avatar_url: row.get(9)?,
                    role: Role::parse(&row.get::<_, String>(10)?).unwrap_or_default(),
                    firm_id: row.get(11)?,
                    created_at: parse_datetime(&row.get::<_, String>(12)?),
                    updated_at: parse_datetime(&row.get::<_, String>(13)?),
                },
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Subscription operations

    fn upsert_subscription(&self, subscription: &Subscription) -> Result<()> {
        self.conn().execute(
            "INSERT INTO subscriptions (id, firm_id, active, price_id, plan, customer_id, \
             subscription_id, current_period_end, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT (firm_id) DO UPDATE SET
                active = excluded.active,
                price_id = excluded.price_id,
                plan = excluded.plan,
                customer_id = excluded.customer_id,
                subscription_id = excluded.subscription_id,
                current_period_end = excluded.current_period_end,
                updated_at = excluded.updated_at",
            params![
                subscription.id,
                subscription.firm_id,
                subscription.active,
                subscription.price_id,
                subscription.plan,
                subscription.customer_id,
                subscription.subscription_id,
                format_datetime(&subscription.current_period_end),
                format_datetime(&subscription.created_at),
                format_datetime(&subscription.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_firm_subscription(&self, firm_id: &str) -> Result<Option<Subscription>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, firm_id, active, price_id, plan, customer_id, subscription_id, \
             current_period_end, created_at, updated_at
             FROM subscriptions WHERE firm_id = ?1",
            params![firm_id],
            |row| {
                Ok(Subscription {
                    id: row.get(0)?,
                    firm_id: row.get(1)?,
                    active: row.get(2)?,
                    price_id: row.get(3)?,
                    plan: row.get(4)?,
                    customer_id: row.get(5)?,
                    subscription_id: row.get(6)?,
                    current_period_end: parse_datetime(&row.get::<_, String>(7)?),
                    created_at: parse_datetime(&row.get::<_, String>(8)?),
                    updated_at: parse_datetime(&row.get::<_, String>(9)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    // Campaign operations

    fn upsert_campaign(&self, campaign: &Campaign) -> Result<()> {
        self.conn().execute(
            "INSERT INTO campaigns (id, sub_sidiary_id, name, description, sub_domain_name, \
             favicon, published, live_products, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                sub_domain_name = excluded.sub_domain_name,
                favicon = excluded.favicon,
                published = excluded.published,
                updated_at = excluded.updated_at",
            params![
                campaign.id,
                campaign.sub_sidiary_id,
                campaign.name,
                campaign.description,
                campaign.sub_domain_name,
                campaign.favicon,
                campaign.published,
                campaign.live_products,
                format_datetime(&campaign.created_at),
                format_datetime(&campaign.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_campaign(&self, id: &str) -> Result<Option<Campaign>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {CAMPAIGN_COLS} FROM campaigns WHERE id = ?1"),
            params![id],
            map_campaign,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_campaign_by_sub_domain(&self, sub_domain_name: &str) -> Result<Option<Campaign>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {CAMPAIGN_COLS} FROM campaigns WHERE sub_domain_name = ?1"),
            params![sub_domain_name],
            map_campaign,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_sub_sidiary_campaigns(&self, sub_sidiary_id: &str) -> Result<Vec<Campaign>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CAMPAIGN_COLS} FROM campaigns WHERE sub_sidiary_id = ?1 ORDER BY name"
        ))?;

        let rows = stmt.query_map(params![sub_sidiary_id], map_campaign)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_campaign_products(&self, id: &str, live_products: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE campaigns SET live_products = ?1, updated_at = ?2 WHERE id = ?3",
            params![live_products, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_campaign(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM campaign_pages WHERE campaign_id = ?1",
            params![id],
        )?;
        let rows = tx.execute("DELETE FROM campaigns WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Campaign page operations

    fn append_campaign_page(&self, page: &CampaignPage) -> Result<CampaignPage> {
        let conn = self.conn();

        conn.execute(
            "INSERT INTO campaign_pages (id, campaign_id, name, path_name, \"order\", visits, \
             content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, \
             (SELECT COUNT(*) FROM campaign_pages WHERE campaign_id = ?2), 0, ?5, ?6, ?7)",
            params![
                page.id,
                page.campaign_id,
                page.name,
                page.path_name,
                page.content,
                format_datetime(&page.created_at),
                format_datetime(&page.updated_at),
            ],
        )?;

        conn.query_row(
            &format!("SELECT {PAGE_COLS} FROM campaign_pages WHERE id = ?1"),
            params![page.id],
            map_campaign_page,
        )
        .map_err(Error::from)
    }

    fn upsert_campaign_page(&self, page: &CampaignPage) -> Result<()> {
        self.conn().execute(
            "INSERT INTO campaign_pages (id, campaign_id, name, path_name, \"order\", visits, \
             content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                path_name = excluded.path_name,
                \"order\" = excluded.\"order\",
                content = excluded.content,
                updated_at = excluded.updated_at",
            params![
                page.id,
                page.campaign_id,
                page.name,
                page.path_name,
                page.order,
                page.visits,
                page.content,
                format_datetime(&page.created_at),
                format_datetime(&page.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_campaign_page(&self, id: &str) -> Result<Option<CampaignPage>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PAGE_COLS} FROM campaign_pages WHERE id = ?1"),
            params![id],
            map_campaign_page,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_campaign_pages(&self, campaign_id: &str) -> Result<Vec<CampaignPage>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PAGE_COLS} FROM campaign_pages WHERE campaign_id = ?1 ORDER BY \"order\""
        ))?;

        let rows = stmt.query_map(params![campaign_id], map_campaign_page)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_campaign_page(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM campaign_pages WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn increment_page_visits(&self, id: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE campaign_pages SET visits = visits + 1 WHERE id = ?1",
            params![id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Sidebar options

    fn insert_sidebar_options(&self, options: &[SidebarOption]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        for option in options {
            tx.execute(
                "INSERT INTO sidebar_options (id, name, icon, link, firm_id, sub_sidiary_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    option.id,
                    option.name,
                    option.icon.as_str(),
                    option.link,
                    option.firm_id,
                    option.sub_sidiary_id,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn list_firm_sidebar_options(&self, firm_id: &str) -> Result<Vec<SidebarOption>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, icon, link, firm_id, sub_sidiary_id
             FROM sidebar_options WHERE firm_id = ?1 ORDER BY name",
        )?;

        let rows = stmt.query_map(params![firm_id], |row| {
            Ok(SidebarOption {
                id: row.get(0)?,
                name: row.get(1)?,
                icon: SidebarIcon::parse(&row.get::<_, String>(2)?)
                    .unwrap_or(SidebarIcon::Category),
                link: row.get(3)?,
                firm_id: row.get(4)?,
                sub_sidiary_id: row.get(5)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_sub_sidiary_sidebar_options(
        &self,
        sub_sidiary_id: &str,
    ) -> Result<Vec<SidebarOption>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, icon, link, firm_id, sub_sidiary_id
             FROM sidebar_options WHERE sub_sidiary_id = ?1 ORDER BY name",
        )?;

        let rows = stmt.query_map(params![sub_sidiary_id], |row| {
            Ok(SidebarOption {
                id: row.get(0)?,
                name: row.get(1)?,
                icon: SidebarIcon::parse(&row.get::<_, String>(2)?)
                    .unwrap_or(SidebarIcon::Category),
                link: row.get(3)?,
                firm_id: row.get(4)?,
                sub_sidiary_id: row.get(5)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, is_admin, user_id, created_at, \
             expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.is_admin,
                token.user_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::TokenLookupCollision)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, token_hash, token_lookup, is_admin, user_id, created_at, expires_at, \
             last_used_at
             FROM tokens WHERE id = ?1",
            params![id],
            map_token,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, token_hash, token_lookup, is_admin, user_id, created_at, expires_at, \
             last_used_at
             FROM tokens WHERE token_lookup = ?1",
            params![lookup],
            map_token,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_user_tokens(&self, user_id: &str) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, token_hash, token_lookup, is_admin, user_id, created_at, expires_at, \
             last_used_at
             FROM tokens WHERE user_id = ?1 ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![user_id], map_token)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    fn has_admin_token(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM tokens WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn make_firm(id: &str) -> Firm {
        let now = Utc::now();
        Firm {
            id: id.to_string(),
            name: "Acme Holdings".to_string(),
            company_email: "owner@acme.test".to_string(),
            company_phone: None,
            white_label: false,
            address: None,
            city: None,
            zip_code: None,
            state: None,
            country: None,
            logo: None,
            customer_id: Some(format!("cus_{id}")),
            goal: 5,
            created_at: now,
            updated_at: now,
        }
    }

    fn make_sub(id: &str, firm_id: &str) -> SubSidiary {
        let now = Utc::now();
        SubSidiary {
            id: id.to_string(),
            firm_id: firm_id.to_string(),
            name: format!("sub-{id}"),
            company_email: format!("{id}@acme.test"),
            company_phone: None,
            address: None,
            city: None,
            zip_code: None,
            state: None,
            country: None,
            logo: None,
            connect_account_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn make_stage(id: &str, sub_id: &str) -> Stage {
        let now = Utc::now();
        Stage {
            id: id.to_string(),
            sub_sidiary_id: sub_id.to_string(),
            name: "Sales".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn make_lane(id: &str, stage_id: &str) -> Lane {
        let now = Utc::now();
        Lane {
            id: id.to_string(),
            stage_id: stage_id.to_string(),
            name: format!("lane-{id}"),
            order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn make_ticket(id: &str, lane_id: &str, value: Option<&str>) -> Ticket {
        let now = Utc::now();
        Ticket {
            id: id.to_string(),
            lane_id: lane_id.to_string(),
            name: format!("ticket-{id}"),
            description: None,
            value: value.map(String::from),
            order: 0,
            assigned_user_id: None,
            customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn seed_board(store: &SqliteStore) {
        store.upsert_firm(&make_firm("firm-1")).unwrap();
        store.upsert_sub_sidiary(&make_sub("sub-1", "firm-1")).unwrap();
        store.upsert_stage(&make_stage("stage-1", "sub-1")).unwrap();
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, store) = test_store();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "firms",
            "sub_sidiaries",
            "users",
            "permissions",
            "invitations",
            "stages",
            "lanes",
            "tickets",
            "tags",
            "ticket_tags",
            "contacts",
            "media",
            "notifications",
            "subscriptions",
            "campaigns",
            "campaign_pages",
            "sidebar_options",
            "tokens",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }
    }

    #[test]
    fn test_append_lane_orders_are_sibling_counts() {
        let (_temp, store) = test_store();
        seed_board(&store);

        for i in 0..4 {
            let lane = store.append_lane(&make_lane(&format!("lane-{i}"), "stage-1")).unwrap();
            assert_eq!(lane.order, i as i64);
        }

        let lanes = store.list_stage_lanes("stage-1").unwrap();
        let orders: Vec<i64> = lanes.iter().map(|l| l.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_reorder_lanes_applies_permutation_densely() {
        let (_temp, store) = test_store();
        seed_board(&store);

        for i in 0..3 {
            store.append_lane(&make_lane(&format!("lane-{i}"), "stage-1")).unwrap();
        }

        store
            .reorder_lanes(
                "stage-1",
                &[
                    "lane-2".to_string(),
                    "lane-0".to_string(),
                    "lane-1".to_string(),
                ],
            )
            .unwrap();

        let lanes = store.list_stage_lanes("stage-1").unwrap();
        let ids: Vec<&str> = lanes.iter().map(|l| l.id.as_str()).collect();
        let orders: Vec<i64> = lanes.iter().map(|l| l.order).collect();
        assert_eq!(ids, vec!["lane-2", "lane-0", "lane-1"]);
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_reorder_lanes_rejects_partial_list() {
        let (_temp, store) = test_store();
        seed_board(&store);

        for i in 0..3 {
            store.append_lane(&make_lane(&format!("lane-{i}"), "stage-1")).unwrap();
        }

        let result = store.reorder_lanes(
            "stage-1",
            &["lane-2".to_string(), "lane-0".to_string()],
        );
        assert!(matches!(result, Err(Error::Conflict(_))));

        // Nothing moved.
        let lanes = store.list_stage_lanes("stage-1").unwrap();
        let ids: Vec<&str> = lanes.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["lane-0", "lane-1", "lane-2"]);
    }

    #[test]
    fn test_cross_lane_ticket_move() {
        let (_temp, store) = test_store();
        seed_board(&store);
        store.append_lane(&make_lane("lane-a", "stage-1")).unwrap();
        store.append_lane(&make_lane("lane-b", "stage-1")).unwrap();

        for i in 0..3 {
            store
                .append_ticket(&make_ticket(&format!("a{i}"), "lane-a", None), &[])
                .unwrap();
        }
        for i in 0..2 {
            store
                .append_ticket(&make_ticket(&format!("b{i}"), "lane-b", None), &[])
                .unwrap();
        }

        // Move a1 into lane-b at position 1.
        let positions = vec![
            TicketPosition {
                ticket_id: "a0".to_string(),
                lane_id: "lane-a".to_string(),
                order: 0,
            },
            TicketPosition {
                ticket_id: "a2".to_string(),
                lane_id: "lane-a".to_string(),
                order: 1,
            },
            TicketPosition {
                ticket_id: "b0".to_string(),
                lane_id: "lane-b".to_string(),
                order: 0,
            },
            TicketPosition {
                ticket_id: "a1".to_string(),
                lane_id: "lane-b".to_string(),
                order: 1,
            },
            TicketPosition {
                ticket_id: "b1".to_string(),
                lane_id: "lane-b".to_string(),
                order: 2,
            },
        ];
        store.reorder_tickets(&positions).unwrap();

        let board = store.list_lanes_with_tickets("stage-1").unwrap();
        let lane_a = &board[0];
        let lane_b = &board[1];

        let a_ids: Vec<&str> = lane_a.tickets.iter().map(|t| t.ticket.id.as_str()).collect();
        let a_orders: Vec<i64> = lane_a.tickets.iter().map(|t| t.ticket.order).collect();
        assert_eq!(a_ids, vec!["a0", "a2"]);
        assert_eq!(a_orders, vec![0, 1]);

        let b_ids: Vec<&str> = lane_b.tickets.iter().map(|t| t.ticket.id.as_str()).collect();
        let b_orders: Vec<i64> = lane_b.tickets.iter().map(|t| t.ticket.order).collect();
        assert_eq!(b_ids, vec!["b0", "a1", "b1"]);
        assert_eq!(b_orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_reorder_tickets_rejects_missing_sibling() {
        let (_temp, store) = test_store();
        seed_board(&store);
        store.append_lane(&make_lane("lane-a", "stage-1")).unwrap();

        store.append_ticket(&make_ticket("t0", "lane-a", None), &[]).unwrap();
        store.append_ticket(&make_ticket("t1", "lane-a", None), &[]).unwrap();

        let result = store.reorder_tickets(&[TicketPosition {
            ticket_id: "t1".to_string(),
            lane_id: "lane-a".to_string(),
            order: 0,
        }]);
        assert!(matches!(result, Err(Error::Conflict(_))));

        let board = store.list_lanes_with_tickets("stage-1").unwrap();
        let orders: Vec<i64> = board[0].tickets.iter().map(|t| t.ticket.order).collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[test]
    fn test_delete_leaves_gap_until_reorder() {
        let (_temp, store) = test_store();
        seed_board(&store);
        store.append_lane(&make_lane("lane-a", "stage-1")).unwrap();

        for i in 0..3 {
            store
                .append_ticket(&make_ticket(&format!("t{i}"), "lane-a", None), &[])
                .unwrap();
        }

        store.delete_ticket("t1").unwrap();

        let board = store.list_lanes_with_tickets("stage-1").unwrap();
        let orders: Vec<i64> = board[0].tickets.iter().map(|t| t.ticket.order).collect();
        // Gap tolerated; the next reorder re-densifies.
        assert_eq!(orders, vec![0, 2]);
    }

    #[test]
    fn test_cascade_delete_sub_sidiary() {
        let (_temp, store) = test_store();
        seed_board(&store);
        store.append_lane(&make_lane("lane-a", "stage-1")).unwrap();
        store.append_ticket(&make_ticket("t0", "lane-a", None), &[]).unwrap();

        let now = Utc::now();
        store
            .upsert_tag(&Tag {
                id: "tag-1".to_string(),
                sub_sidiary_id: "sub-1".to_string(),
                name: "hot".to_string(),
                color: "#f00".to_string(),
                created_at: now,
            })
            .unwrap();
        store.set_ticket_tags("t0", &["tag-1".to_string()]).unwrap();
        store
            .upsert_contact(&Contact {
                id: "c-1".to_string(),
                sub_sidiary_id: "sub-1".to_string(),
                name: "Jo".to_string(),
                email: "jo@x.test".to_string(),
                created_at: now,
            })
            .unwrap();
        store
            .create_media(&Media {
                id: "m-1".to_string(),
                sub_sidiary_id: "sub-1".to_string(),
                name: "logo".to_string(),
                link: "https://cdn.test/logo.png".to_string(),
                created_at: now,
            })
            .unwrap();
        store
            .upsert_campaign(&Campaign {
                id: "cmp-1".to_string(),
                sub_sidiary_id: "sub-1".to_string(),
                name: "launch".to_string(),
                description: None,
                sub_domain_name: Some("launch".to_string()),
                favicon: None,
                published: true,
                live_products: "[]".to_string(),
                created_at: now,
                updated_at: now,
            })
            .unwrap();
        store
            .append_campaign_page(&CampaignPage {
                id: "pg-1".to_string(),
                campaign_id: "cmp-1".to_string(),
                name: "Home".to_string(),
                path_name: String::new(),
                order: 0,
                visits: 0,
                content: "[]".to_string(),
                created_at: now,
                updated_at: now,
            })
            .unwrap();

        assert!(store.delete_sub_sidiary("sub-1").unwrap());

        assert!(store.get_sub_sidiary("sub-1").unwrap().is_none());
        assert!(store.get_stage("stage-1").unwrap().is_none());
        assert!(store.get_lane("lane-a").unwrap().is_none());
        assert!(store.get_ticket("t0").unwrap().is_none());
        assert!(store.get_tag("tag-1").unwrap().is_none());
        assert!(store.get_contact("c-1").unwrap().is_none());
        assert!(store.get_media("m-1").unwrap().is_none());
        assert!(store.get_campaign("cmp-1").unwrap().is_none());
        assert!(store.get_campaign_page("pg-1").unwrap().is_none());
    }

    #[test]
    fn test_delete_firm_removes_subtrees_and_users() {
        let (_temp, store) = test_store();
        seed_board(&store);
        store.upsert_sub_sidiary(&make_sub("sub-2", "firm-1")).unwrap();

        let now = Utc::now();
        store
            .create_user(&User {
                id: "u-1".to_string(),
                email: "owner@acme.test".to_string(),
                name: "Owner".to_string(),
                avatar_url: None,
                role: Role::FirmOwner,
                firm_id: Some("firm-1".to_string()),
                created_at: now,
                updated_at: now,
            })
            .unwrap();

        assert!(store.delete_firm("firm-1").unwrap());
        assert!(store.get_firm("firm-1").unwrap().is_none());
        assert!(store.get_sub_sidiary("sub-1").unwrap().is_none());
        assert!(store.get_sub_sidiary("sub-2").unwrap().is_none());
        assert!(store.get_user("u-1").unwrap().is_none());
    }

    #[test]
    fn test_subscription_upsert_is_one_row_per_firm() {
        let (_temp, store) = test_store();
        store.upsert_firm(&make_firm("firm-1")).unwrap();

        let now = Utc::now();
        let mut sub = Subscription {
            id: "s-1".to_string(),
            firm_id: "firm-1".to_string(),
            active: true,
            price_id: "price_basic".to_string(),
            plan: "price_basic".to_string(),
            customer_id: "cus_firm-1".to_string(),
            subscription_id: "sub_123".to_string(),
            current_period_end: now,
            created_at: now,
            updated_at: now,
        };
        store.upsert_subscription(&sub).unwrap();

        sub.id = "s-2".to_string();
        sub.price_id = "price_pro".to_string();
        store.upsert_subscription(&sub).unwrap();

        let fetched = store.get_firm_subscription("firm-1").unwrap().unwrap();
        assert_eq!(fetched.price_id, "price_pro");
        assert_eq!(fetched.id, "s-1"); // first row kept, updated in place
    }

    #[test]
    fn test_page_visits_increment_by_one() {
        let (_temp, store) = test_store();
        seed_board(&store);

        let now = Utc::now();
        store
            .upsert_campaign(&Campaign {
                id: "cmp-1".to_string(),
                sub_sidiary_id: "sub-1".to_string(),
                name: "launch".to_string(),
                description: None,
                sub_domain_name: Some("launch".to_string()),
                favicon: None,
                published: true,
                live_products: "[]".to_string(),
                created_at: now,
                updated_at: now,
            })
            .unwrap();
        store
            .append_campaign_page(&CampaignPage {
                id: "pg-1".to_string(),
                campaign_id: "cmp-1".to_string(),
                name: "Home".to_string(),
                path_name: String::new(),
                order: 0,
                visits: 0,
                content: "[]".to_string(),
                created_at: now,
                updated_at: now,
            })
            .unwrap();

        store.increment_page_visits("pg-1").unwrap();
        store.increment_page_visits("pg-1").unwrap();

        let page = store.get_campaign_page("pg-1").unwrap().unwrap();
        assert_eq!(page.visits, 2);
    }

    #[test]
    fn test_duplicate_user_email_rejected() {
        let (_temp, store) = test_store();
        let now = Utc::now();
        let user = User {
            id: "u-1".to_string(),
            email: "dup@x.test".to_string(),
            name: "One".to_string(),
            avatar_url: None,
            role: Role::SubsidiaryUser,
            firm_id: None,
            created_at: now,
            updated_at: now,
        };
        store.create_user(&user).unwrap();

        let mut other = user.clone();
        other.id = "u-2".to_string();
        let result = store.create_user(&other);
        assert!(matches!(result, Err(Error::AlreadyExists)));
    }
}
