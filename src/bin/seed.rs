use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axolotl_music_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    entity::EMPLOYEE_GROUP,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_staff(&pool, "admin", "admin@example.com", "admin123").await?;
    let customer_id = ensure_customer(&pool, "cliente", "cliente@example.com", "cliente123").await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();
    Ok(hash)
}

async fn ensure_identity(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    is_staff: bool,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, is_staff)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (username) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(is_staff)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE username = $1")
                .bind(username)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {username} (staff={is_staff})");
    Ok(user_id)
}

async fn ensure_staff(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let user_id = ensure_identity(pool, username, email, password, true).await?;

    let group_row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO role_groups (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(EMPLOYEE_GROUP)
    .fetch_optional(pool)
    .await?;

    let group_id = match group_row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM role_groups WHERE name = $1")
                .bind(EMPLOYEE_GROUP)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    sqlx::query(
        r#"
        INSERT INTO role_group_members (id, group_id, user_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (group_id, user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(group_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(user_id)
}

async fn ensure_customer(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let user_id = ensure_identity(pool, username, email, password, false).await?;

    sqlx::query(
        r#"
        INSERT INTO customer_profiles (id, user_id, name, email, phone, address, postal_code)
        VALUES ($1, $2, $3, $4, '', '', 0)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(username)
    .bind(email)
    .execute(pool)
    .await?;

    Ok(user_id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let artists = [
        ("Los Ajolotes", "Mexican surf rock quartet"),
        ("Marina Delgado", "Flamenco-pop singer-songwriter"),
        ("Teorema", "Instrumental post-rock collective"),
    ];

    let mut artist_ids = Vec::new();
    for (name, description) in artists {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO artists (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .fetch_optional(pool)
        .await?;

        let id = match row {
            Some((id,)) => id,
            None => {
                let existing: (Uuid,) = sqlx::query_as("SELECT id FROM artists WHERE name = $1")
                    .bind(name)
                    .fetch_one(pool)
                    .await?;
                existing.0
            }
        };
        artist_ids.push(id);
    }

    let products = [
        (artist_ids[0], "Marea Baja", "Rock", "vinilo", "23.99", 30, true),
        (artist_ids[0], "Marea Baja", "Rock", "cd", "12.50", 80, true),
        (artist_ids[1], "Duende", "Flamenco", "vinilo", "27.00", 15, false),
        (artist_ids[1], "Duende", "Flamenco", "casete", "8.75", 40, false),
        (artist_ids[2], "Axiomas", "Post-rock", "cd", "14.25", 60, true),
        (artist_ids[2], "Axiomas", "Post-rock", "vinilo", "29.99", 20, false),
    ];

    for (artist_id, name, genre, kind, price, stock, is_new) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, artist_id, name, genre, kind, description, stock, price, is_new_release)
            VALUES ($1, $2, $3, $4, $5, '', $6, $7, $8)
            ON CONFLICT (artist_id, name, kind) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(artist_id)
        .bind(name)
        .bind(genre)
        .bind(kind)
        .bind(stock)
        .bind(price.parse::<Decimal>()?)
        .bind(is_new)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}
