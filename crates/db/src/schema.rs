use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

// Users and businesses are owned by the account and catalog services; the
// booking core reads them and only ever writes the business rating columns.
const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL UNIQUE,
        role VARCHAR(20) NOT NULL CHECK (role IN ('customer', 'business', 'admin')),
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS businesses (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES users(id),
        name VARCHAR(255) NOT NULL,
        is_approved BOOLEAN NOT NULL DEFAULT FALSE,
        rating NUMERIC(3,2) NOT NULL DEFAULT 0.00,
        total_reviews INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS services (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        business_id UUID NOT NULL REFERENCES businesses(id),
        service_name VARCHAR(255) NOT NULL,
        price NUMERIC(10,2) NOT NULL CHECK (price >= 0),
        duration INTEGER NOT NULL CHECK (duration > 0),
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS time_slots (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        service_id UUID NOT NULL REFERENCES services(id),
        start_time TIMESTAMP WITH TIME ZONE NOT NULL,
        end_time TIMESTAMP WITH TIME ZONE NOT NULL,
        is_booked BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT valid_time_range CHECK (end_time > start_time)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        customer_id UUID NOT NULL REFERENCES users(id),
        business_id UUID NOT NULL REFERENCES businesses(id),
        service_id UUID NOT NULL REFERENCES services(id),
        timeslot_id UUID NOT NULL REFERENCES time_slots(id),
        status VARCHAR(20) NOT NULL DEFAULT 'booked'
            CHECK (status IN ('booked', 'confirmed', 'completed', 'cancelled', 'no-show')),
        customer_notes TEXT NULL,
        total_price NUMERIC(10,2) NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        booking_id UUID NOT NULL UNIQUE REFERENCES bookings(id),
        amount NUMERIC(10,2) NOT NULL,
        currency VARCHAR(3) NOT NULL,
        status VARCHAR(20) NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'completed', 'failed', 'refunded')),
        payment_method VARCHAR(50) NULL,
        payment_reference VARCHAR(255) NULL,
        paid_at TIMESTAMP WITH TIME ZONE NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        booking_id UUID NOT NULL UNIQUE REFERENCES bookings(id),
        business_id UUID NOT NULL REFERENCES businesses(id),
        customer_id UUID NOT NULL REFERENCES users(id),
        rating INTEGER NOT NULL CHECK (rating >= 1 AND rating <= 5),
        comment TEXT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_businesses_user_id ON businesses(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_services_business_id ON services(business_id)",
    "CREATE INDEX IF NOT EXISTS idx_time_slots_service_id ON time_slots(service_id)",
    "CREATE INDEX IF NOT EXISTS idx_time_slots_start_time ON time_slots(start_time)",
    "CREATE INDEX IF NOT EXISTS idx_bookings_customer_id ON bookings(customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_bookings_business_id ON bookings(business_id)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_business_id ON reviews(business_id)",
    // At most one live booking per slot.
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_active_slot \
     ON bookings(timeslot_id) WHERE status <> 'cancelled'",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_payments_reference \
     ON payments(payment_reference) WHERE payment_reference IS NOT NULL",
];

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    for statement in TABLES.iter().chain(INDEXES) {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
