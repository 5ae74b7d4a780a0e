//! # Seed Data Generator
//!
//! Populates the database with a demo salon for development.
//!
//! ## Usage
//! ```bash
//! # Seed 30 days of history (default)
//! cargo run -p sheba-db --bin seed
//!
//! # Custom history depth
//! cargo run -p sheba-db --bin seed -- --days 90
//!
//! # Specify database path
//! cargo run -p sheba-db --bin seed -- --db ./data/sheba.db
//! ```
//!
//! ## Generated Data
//! - One salon ("Zemen Beauty") with a main and a second branch
//! - Four staff members (one scoped to the second branch)
//! - A service menu across three categories, mixing percentage and fixed
//!   commission rules
//! - A pool of clients
//! - A booked history: completed appointments with settled payments, plus
//!   a scattering of cancellations and no-shows
//!
//! Commission splits are NOT seeded: they are the engine's job, and the
//! reconciler will finalize them on demand from this ledger.

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use std::env;
use uuid::Uuid;

use sheba_core::{
    Appointment, AppointmentStatus, Branch, CommissionRule, Money, Payment, PaymentMethod,
    PaymentStatus, Rate, Salon, SalonSize, SalonType, Service, ServiceCategory, Staff, StaffRole,
    User, UserRole,
};
use sheba_db::{Database, DbConfig};

const SALON_ID: &str = "salon-zemen";
const MAIN_BRANCH_ID: &str = "branch-bole";
const SECOND_BRANCH_ID: &str = "branch-piassa";

/// (staff id suffix, first name, last name, role, branch scope)
const STAFF: &[(&str, &str, &str, StaffRole, Option<&str>)] = &[
    ("hanna", "Hanna", "Tesfaye", StaffRole::Stylist, None),
    ("meron", "Meron", "Abebe", StaffRole::Stylist, None),
    ("liya", "Liya", "Bekele", StaffRole::Stylist, Some(SECOND_BRANCH_ID)),
    ("samuel", "Samuel", "Girma", StaffRole::Manager, None),
];

/// (category, services: (name, minutes, price cents, rule))
const MENU: &[(&str, &[(&str, u32, i64, SeedRule)])] = &[
    (
        "Hair",
        &[
            ("Haircut", 30, 35000, SeedRule::Percentage(3000)),
            ("Hair Color", 90, 120000, SeedRule::Percentage(3500)),
            ("Braiding", 120, 95000, SeedRule::Percentage(4000)),
            ("Blow Dry", 45, 40000, SeedRule::Fixed(12000)),
        ],
    ),
    (
        "Nails",
        &[
            ("Manicure", 45, 30000, SeedRule::Fixed(10000)),
            ("Pedicure", 60, 38000, SeedRule::Fixed(12000)),
        ],
    ),
    (
        "Spa",
        &[
            ("Facial", 60, 65000, SeedRule::Percentage(2500)),
            ("Full Body Massage", 90, 110000, SeedRule::Percentage(3000)),
        ],
    ),
];

const CLIENT_FIRST_NAMES: &[&str] = &[
    "Sara", "Helen", "Ruth", "Bethlehem", "Eden", "Mahlet", "Tsion", "Selam", "Dagmawit", "Hiwot",
];

/// Commission rule in const-friendly form.
#[derive(Clone, Copy)]
enum SeedRule {
    /// Basis points of the price
    Percentage(u32),
    /// Fixed cents
    Fixed(i64),
}

impl From<SeedRule> for CommissionRule {
    fn from(rule: SeedRule) -> Self {
        match rule {
            SeedRule::Percentage(bps) => CommissionRule::Percentage(Rate::from_bps(bps)),
            SeedRule::Fixed(cents) => CommissionRule::Fixed(Money::from_cents(cents)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut days: u64 = 30;
    let mut db_path = String::from("./sheba_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(30);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Sheba Salon Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of appointment history (default: 30)");
                println!("  -d, --db <PATH>    Database file path (default: ./sheba_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Sheba Salon Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!("History:  {} days", days);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.catalog().salon(SALON_ID).await?.is_some() {
        println!("⚠ Database already seeded ({SALON_ID} exists)");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let clients = seed_catalog(&db).await?;
    println!("✓ Catalog seeded");

    let booked = seed_history(&db, &clients, days).await?;
    println!("✓ Seeded {booked} appointments over {days} days");

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Seeds users, the salon, branches, staff, and the service menu.
/// Returns the client user ids for the history generator.
async fn seed_catalog(db: &Database) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let catalog = db.catalog();
    let now = Utc::now();

    let owner = User {
        id: "user-owner".to_string(),
        email: "owner@zemen.example".to_string(),
        first_name: "Selam".to_string(),
        last_name: "Haile".to_string(),
        phone: "+251911000000".to_string(),
        role: UserRole::SalonAdmin,
        is_verified: true,
        created_at: now,
    };
    catalog.insert_user(&owner).await?;

    catalog
        .insert_salon(&Salon {
            id: SALON_ID.to_string(),
            name: "Zemen Beauty".to_string(),
            description: Some("Full-service salon and spa".to_string()),
            owner_id: owner.id.clone(),
            phone: "+251911000000".to_string(),
            email: "hello@zemen.example".to_string(),
            address: "Bole Road".to_string(),
            city: "Addis Ababa".to_string(),
            country: "Ethiopia".to_string(),
            salon_type: SalonType::Beauty,
            size: SalonSize::Medium,
            commission_rate: Rate::from_bps(4000),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await?;

    for (id, name, address, is_main) in [
        (MAIN_BRANCH_ID, "Bole", "Bole Road", true),
        (SECOND_BRANCH_ID, "Piassa", "Churchill Avenue", false),
    ] {
        catalog
            .insert_branch(&Branch {
                id: id.to_string(),
                salon_id: SALON_ID.to_string(),
                name: name.to_string(),
                address: address.to_string(),
                phone: "+251911000001".to_string(),
                email: None,
                is_main_branch: is_main,
                is_active: true,
                created_at: now,
            })
            .await?;
    }

    for (suffix, first, last, role, branch) in STAFF {
        let user = User {
            id: format!("user-{suffix}"),
            email: format!("{suffix}@zemen.example"),
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone: "+251911000002".to_string(),
            role: UserRole::Stylist,
            is_verified: true,
            created_at: now,
        };
        catalog.insert_user(&user).await?;

        catalog
            .insert_staff(&Staff {
                id: format!("staff-{suffix}"),
                user_id: user.id,
                salon_id: SALON_ID.to_string(),
                branch_id: branch.map(str::to_string),
                role: *role,
                specialization: None,
                commission_percentage: Rate::from_bps(4000),
                is_active: true,
                hire_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
                created_at: now,
            })
            .await?;
    }

    for (category_name, services) in MENU {
        let category = ServiceCategory {
            id: format!("cat-{}", category_name.to_lowercase()),
            salon_id: SALON_ID.to_string(),
            name: category_name.to_string(),
            description: None,
            created_at: now,
        };
        catalog.insert_category(&category).await?;

        for (name, minutes, price_cents, rule) in *services {
            catalog
                .insert_service(&Service {
                    id: format!("svc-{}", name.to_lowercase().replace(' ', "-")),
                    salon_id: SALON_ID.to_string(),
                    category_id: category.id.clone(),
                    name: name.to_string(),
                    description: None,
                    duration_minutes: *minutes,
                    price: Money::from_cents(*price_cents),
                    commission: (*rule).into(),
                    is_active: true,
                    created_at: now,
                })
                .await?;
        }
    }

    let mut clients = Vec::new();
    for (idx, first) in CLIENT_FIRST_NAMES.iter().enumerate() {
        let client = User {
            id: format!("user-client-{idx}"),
            email: format!("client{idx}@example.com"),
            first_name: first.to_string(),
            last_name: "Kebede".to_string(),
            phone: format!("+2519220000{idx:02}"),
            role: UserRole::Client,
            is_verified: true,
            created_at: now,
        };
        catalog.insert_user(&client).await?;
        clients.push(client.id);
    }

    Ok(clients)
}

/// Seeds a booked history: a plausible spread of appointments per staff
/// per day, completed ones settled with a payment.
async fn seed_history(
    db: &Database,
    clients: &[String],
    days: u64,
) -> Result<usize, Box<dyn std::error::Error>> {
    let services: Vec<Service> = db.catalog().services_by_salon(SALON_ID).await?;
    let staff: Vec<Staff> = db.catalog().staff_by_salon(SALON_ID).await?;
    let today = Utc::now().date_naive();

    let mut booked = 0usize;
    for day_offset in 1..=days {
        let date = match today.checked_sub_days(Days::new(day_offset)) {
            Some(d) => d,
            None => break,
        };

        for (staff_idx, member) in staff.iter().enumerate() {
            // 2-4 appointments per staff per day, back to back from 09:30
            let count = 2 + (day_offset as usize + staff_idx) % 3;
            let mut cursor = NaiveTime::from_hms_opt(9, 30, 0).unwrap();

            for slot_idx in 0..count {
                let seed = day_offset as usize * 31 + staff_idx * 7 + slot_idx;
                let service = &services[seed % services.len()];
                let client = &clients[seed % clients.len()];
                let branch_id = member
                    .branch_id
                    .clone()
                    .unwrap_or_else(|| MAIN_BRANCH_ID.to_string());

                let start = cursor;
                let end = start + chrono::Duration::minutes(service.duration_minutes as i64);
                // Gap between appointments varies the day's texture
                cursor = end + chrono::Duration::minutes(((seed % 3) * 15) as i64);

                // Roughly 1 in 12 cancelled, 1 in 20 no-show, rest completed
                let status = if seed % 12 == 0 {
                    AppointmentStatus::Cancelled
                } else if seed % 20 == 7 {
                    AppointmentStatus::NoShow
                } else {
                    AppointmentStatus::Completed
                };

                let now = Utc::now();
                let appointment = Appointment {
                    id: Uuid::new_v4().to_string(),
                    salon_id: SALON_ID.to_string(),
                    branch_id,
                    client_id: client.clone(),
                    staff_id: member.id.clone(),
                    service_id: service.id.clone(),
                    status,
                    appointment_date: date,
                    start_time: start,
                    end_time: end,
                    total_price: service.price,
                    notes: None,
                    created_at: now,
                    updated_at: now,
                };
                db.appointments().insert(&appointment).await?;
                booked += 1;

                if status == AppointmentStatus::Completed {
                    let methods = [
                        PaymentMethod::Cash,
                        PaymentMethod::Chapa,
                        PaymentMethod::Telebirr,
                        PaymentMethod::Card,
                    ];
                    db.payments()
                        .insert(&Payment {
                            id: Uuid::new_v4().to_string(),
                            appointment_id: appointment.id.clone(),
                            amount: appointment.total_price,
                            method: methods[seed % methods.len()],
                            status: PaymentStatus::Completed,
                            transaction_id: Some(format!("tx-{seed:06}")),
                            paid_at: Some(now),
                            created_at: now,
                        })
                        .await?;
                }
            }
        }

        if day_offset % 10 == 0 {
            println!("  Seeded through {date}...");
        }
    }

    Ok(booked)
}
