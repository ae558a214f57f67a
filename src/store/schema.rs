pub const SCHEMA: &str = r#"
-- Firms are the top-level tenants
CREATE TABLE IF NOT EXISTS firms (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    company_email TEXT NOT NULL,
    company_phone TEXT,
    white_label INTEGER NOT NULL DEFAULT 0,
    address TEXT,
    city TEXT,
    zip_code TEXT,
    state TEXT,
    country TEXT,
    logo TEXT,

    -- External billing customer reference
    customer_id TEXT,

    -- Subsidiary-count target for the dashboard
    goal INTEGER NOT NULL DEFAULT 5,

    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Sub-accounts under a firm
CREATE TABLE IF NOT EXISTS sub_sidiaries (
    id TEXT PRIMARY KEY,
    firm_id TEXT NOT NULL REFERENCES firms(id),
    name TEXT NOT NULL,
    company_email TEXT NOT NULL,
    company_phone TEXT,
    address TEXT,
    city TEXT,
    zip_code TEXT,
    state TEXT,
    country TEXT,
    logo TEXT,
    connect_account_id TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Users; email is the cross-system identity key
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    avatar_url TEXT,
    role TEXT NOT NULL DEFAULT 'SUBSIDIARY_USER',
    firm_id TEXT REFERENCES firms(id),
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Explicit per-subsidiary grants; not roles
CREATE TABLE IF NOT EXISTS permissions (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    sub_sidiary_id TEXT NOT NULL REFERENCES sub_sidiaries(id),
    access INTEGER NOT NULL DEFAULT 0,

    UNIQUE(email, sub_sidiary_id)
);

-- Pending team invitations; consumed (deleted) on first matching sign-in
CREATE TABLE IF NOT EXISTS invitations (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    firm_id TEXT NOT NULL REFERENCES firms(id),
    role TEXT NOT NULL DEFAULT 'SUBSIDIARY_USER',
    status TEXT NOT NULL DEFAULT 'PENDING',
    created_at TEXT DEFAULT (datetime('now'))
);

-- Pipeline: stages own lanes, lanes own tickets
CREATE TABLE IF NOT EXISTS stages (
    id TEXT PRIMARY KEY,
    sub_sidiary_id TEXT NOT NULL REFERENCES sub_sidiaries(id),
    name TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS lanes (
    id TEXT PRIMARY KEY,
    stage_id TEXT NOT NULL REFERENCES stages(id),
    name TEXT NOT NULL,

    -- Dense 0-based within the stage after the latest committed reorder
    "order" INTEGER NOT NULL DEFAULT 0,

    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS tickets (
    id TEXT PRIMARY KEY,
    lane_id TEXT NOT NULL REFERENCES lanes(id),
    name TEXT NOT NULL,
    description TEXT,

    -- Decimal-as-string, validated against the currency pattern at the API
    value TEXT,

    "order" INTEGER NOT NULL DEFAULT 0,
    assigned_user_id TEXT REFERENCES users(id),
    customer_id TEXT REFERENCES contacts(id),
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Tags (many-to-many with tickets)
CREATE TABLE IF NOT EXISTS tags (
    id TEXT PRIMARY KEY,
    sub_sidiary_id TEXT NOT NULL REFERENCES sub_sidiaries(id),
    name TEXT NOT NULL,
    color TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),

    UNIQUE(sub_sidiary_id, name)
);

CREATE TABLE IF NOT EXISTS ticket_tags (
    ticket_id TEXT REFERENCES tickets(id),
    tag_id TEXT REFERENCES tags(id),
    PRIMARY KEY (ticket_id, tag_id)
);

CREATE TABLE IF NOT EXISTS contacts (
    id TEXT PRIMARY KEY,
    sub_sidiary_id TEXT NOT NULL REFERENCES sub_sidiaries(id),
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS media (
    id TEXT PRIMARY KEY,
    sub_sidiary_id TEXT NOT NULL REFERENCES sub_sidiaries(id),
    name TEXT NOT NULL,
    link TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Append-only activity log, firm-keyed, optionally subsidiary-scoped
CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    notification TEXT NOT NULL,
    firm_id TEXT NOT NULL REFERENCES firms(id),
    sub_sidiary_id TEXT REFERENCES sub_sidiaries(id),
    user_id TEXT NOT NULL REFERENCES users(id),
    created_at TEXT DEFAULT (datetime('now'))
);

-- One subscription per firm, projected from billing webhook events
CREATE TABLE IF NOT EXISTS subscriptions (
    id TEXT PRIMARY KEY,
    firm_id TEXT NOT NULL UNIQUE REFERENCES firms(id),
    active INTEGER NOT NULL DEFAULT 0,
    price_id TEXT NOT NULL,
    plan TEXT NOT NULL,
    customer_id TEXT NOT NULL,
    subscription_id TEXT NOT NULL,
    current_period_end TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS campaigns (
    id TEXT PRIMARY KEY,
    sub_sidiary_id TEXT NOT NULL REFERENCES sub_sidiaries(id),
    name TEXT NOT NULL,
    description TEXT,
    sub_domain_name TEXT UNIQUE,
    favicon TEXT,
    published INTEGER NOT NULL DEFAULT 0,
    live_products TEXT NOT NULL DEFAULT '[]',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS campaign_pages (
    id TEXT PRIMARY KEY,
    campaign_id TEXT NOT NULL REFERENCES campaigns(id),
    name TEXT NOT NULL,

    -- Empty string marks the default/root page
    path_name TEXT NOT NULL DEFAULT '',

    "order" INTEGER NOT NULL DEFAULT 0,
    visits INTEGER NOT NULL DEFAULT 0,
    content TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Sidebar entries, owned by exactly one of firm or subsidiary
CREATE TABLE IF NOT EXISTS sidebar_options (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    icon TEXT NOT NULL,
    link TEXT NOT NULL,
    firm_id TEXT REFERENCES firms(id),
    sub_sidiary_id TEXT REFERENCES sub_sidiaries(id),

    CHECK ((firm_id IS NULL) != (sub_sidiary_id IS NULL))
);

-- Tokens are auth credentials; non-admin tokens must belong to a user
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,          -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,        -- short prefix for fast lookup
    is_admin INTEGER NOT NULL DEFAULT 0,
    user_id TEXT REFERENCES users(id),
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,            -- NULL = never
    last_used_at TEXT
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_sub_sidiaries_firm ON sub_sidiaries(firm_id);
CREATE INDEX IF NOT EXISTS idx_users_firm ON users(firm_id);
CREATE INDEX IF NOT EXISTS idx_permissions_email ON permissions(email);
CREATE INDEX IF NOT EXISTS idx_permissions_sub_sidiary ON permissions(sub_sidiary_id);
CREATE INDEX IF NOT EXISTS idx_stages_sub_sidiary ON stages(sub_sidiary_id);
CREATE INDEX IF NOT EXISTS idx_lanes_stage ON lanes(stage_id);
CREATE INDEX IF NOT EXISTS idx_tickets_lane ON tickets(lane_id);
CREATE INDEX IF NOT EXISTS idx_tags_sub_sidiary ON tags(sub_sidiary_id);
CREATE INDEX IF NOT EXISTS idx_contacts_sub_sidiary ON contacts(sub_sidiary_id);
CREATE INDEX IF NOT EXISTS idx_media_sub_sidiary ON media(sub_sidiary_id);
CREATE INDEX IF NOT EXISTS idx_notifications_firm ON notifications(firm_id);
CREATE INDEX IF NOT EXISTS idx_campaigns_sub_sidiary ON campaigns(sub_sidiary_id);
CREATE INDEX IF NOT EXISTS idx_campaign_pages_campaign ON campaign_pages(campaign_id);
CREATE INDEX IF NOT EXISTS idx_sidebar_options_firm ON sidebar_options(firm_id);
CREATE INDEX IF NOT EXISTS idx_sidebar_options_sub_sidiary ON sidebar_options(sub_sidiary_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_tokens_lookup ON tokens(token_lookup);
CREATE INDEX IF NOT EXISTS idx_tokens_user ON tokens(user_id);
CREATE INDEX IF NOT EXISTS idx_firms_customer ON firms(customer_id);
"#;
