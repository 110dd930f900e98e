// Table definitions, applied in order by Database::migrate.
//
// Every child table cascades on delete of its parent, so removing a user
// removes its family members and everything attached to them.

pub const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        email           TEXT NOT NULL UNIQUE,
        hashed_password TEXT NOT NULL,
        full_name       TEXT,
        date_of_birth   DATE,
        phone_number    TEXT,
        is_active       BOOLEAN NOT NULL DEFAULT 1,
        is_superuser    BOOLEAN NOT NULL DEFAULT 0,
        created_at      DATETIME NOT NULL,
        updated_at      DATETIME NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS family_members (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id           INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        full_name         TEXT NOT NULL,
        relationship      TEXT NOT NULL,
        date_of_birth     DATE,
        phone_number      TEXT,
        emergency_contact BOOLEAN NOT NULL DEFAULT 0,
        notes             TEXT,
        created_at        DATETIME NOT NULL,
        updated_at        DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_family_members_user_id ON family_members(user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS health_records (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        family_member_id INTEGER NOT NULL REFERENCES family_members(id) ON DELETE CASCADE,
        record_type      TEXT NOT NULL,
        title            TEXT NOT NULL,
        description      TEXT,
        date_recorded    DATETIME NOT NULL,
        doctor_name      TEXT,
        hospital_clinic  TEXT,
        severity         TEXT,
        status           TEXT,
        notes            TEXT,
        created_at       DATETIME NOT NULL,
        updated_at       DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_health_records_member ON health_records(family_member_id)",
    r#"
    CREATE TABLE IF NOT EXISTS medications (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        family_member_id INTEGER NOT NULL REFERENCES family_members(id) ON DELETE CASCADE,
        name             TEXT NOT NULL,
        dosage           TEXT NOT NULL,
        frequency        TEXT NOT NULL,
        start_date       DATE NOT NULL,
        end_date         DATE,
        prescribed_by    TEXT,
        purpose          TEXT,
        side_effects     TEXT,
        is_active        BOOLEAN NOT NULL DEFAULT 1,
        notes            TEXT,
        created_at       DATETIME NOT NULL,
        updated_at       DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_medications_member ON medications(family_member_id)",
    r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        family_member_id INTEGER NOT NULL REFERENCES family_members(id) ON DELETE CASCADE,
        title            TEXT NOT NULL,
        doctor_name      TEXT,
        hospital_clinic  TEXT,
        appointment_date DATETIME NOT NULL,
        appointment_type TEXT,
        status           TEXT NOT NULL DEFAULT 'scheduled',
        notes            TEXT,
        created_at       DATETIME NOT NULL,
        updated_at       DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_appointments_member ON appointments(family_member_id)",
];
