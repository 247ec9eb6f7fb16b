//! Demo rows inserted by the "insert dummy data" actions.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{
    CaseDraft, CaseRecord, MailDraft, MailEntry, TrackingDraft, TrackingSession, UserDraft,
    UserProfile,
};
use crate::schema::Entity;

/// An entity with a fixed demo data set.
pub trait Seeded: Entity {
    /// Demo drafts, all valid and mutually non-conflicting.
    fn seed() -> Vec<Self::Draft>;
}

impl Seeded for CaseRecord {
    fn seed() -> Vec<CaseDraft> {
        cases()
    }
}

impl Seeded for MailEntry {
    fn seed() -> Vec<MailDraft> {
        mails()
    }
}

impl Seeded for UserProfile {
    fn seed() -> Vec<UserDraft> {
        users()
    }
}

impl Seeded for TrackingSession {
    fn seed() -> Vec<TrackingDraft> {
        tracking()
    }
}

fn owned(items: &[&str]) -> Option<Vec<String>> {
    Some(items.iter().map(ToString::to_string).collect())
}

fn text(s: &str) -> Option<String> {
    Some(s.to_string())
}

/// Ten phone cases; 480 units worth 172 120 in total.
#[must_use]
#[allow(clippy::type_complexity)]
pub fn cases() -> Vec<CaseDraft> {
    // name, model, material, color, price, description, stock, brand, features
    let rows: [(&str, &str, &str, &str, i64, &str, i32, &str, &[&str]); 10] = [
        (
            "Funda Silicona Suave",
            "iPhone 16",
            "Silicona",
            "Negro",
            299,
            "Funda de silicona suave al tacto, protección total",
            50,
            "Apple",
            &["Protección anti-golpes", "Suave al tacto", "Acceso a todos los botones"],
        ),
        (
            "Funda Transparente Ultra Delgada",
            "iPhone 16 Pro",
            "TPU",
            "Transparente",
            199,
            "Protección invisible que muestra el diseño original",
            75,
            "Spigen",
            &["Ultra delgada", "Cristal claro", "Anti-amarilleo"],
        ),
        (
            "Funda Cuero Premium",
            "iPhone 16 Pro Max",
            "Cuero",
            "Marrón",
            899,
            "Elegante funda de cuero genuino con acabado premium",
            30,
            "Apple",
            &["Cuero genuino", "Envejecimiento natural", "Ranuras para tarjetas"],
        ),
        (
            "Funda Resistente MIL-STD",
            "Phone 16",
            "TPU + Policarbonato",
            "Negro",
            499,
            "Protección militar contra caídas hasta 3 metros",
            40,
            "OtterBox",
            &["Certificación militar", "Doble capa", "Esquinas reforzadas", "Protector de pantalla"],
        ),
        (
            "Funda Líquida Brillante",
            "iPhone 16",
            "Silicona líquida",
            "Rosa",
            349,
            "Acabado sedoso con brillo elegante",
            60,
            "CaseNerd",
            &["Acabado sedoso", "Colores vibrantes", "Interior suave"],
        ),
        (
            "Funda con Soporte MagSafe",
            "iPhone 16 Pro",
            "Policarbonato",
            "Azul",
            599,
            "Compatible con MagSafe y soporte integrado",
            35,
            "Apple",
            &["Compatible MagSafe", "Soporte integrado", "Carga inalámbrica"],
        ),
        (
            "Funda Minimalista",
            "Phone 16 Pro",
            "Plástico duro",
            "Blanco",
            149,
            "Diseño ultra delgado y minimalista",
            100,
            "Peel",
            &["Ultra delgada 0.35mm", "Peso mínimo", "Mate"],
        ),
        (
            "Funda Efecto Mármol",
            "iPhone 16",
            "TPU",
            "Blanco/Gris",
            279,
            "Diseño elegante con efecto mármol",
            45,
            "Velvet Caviar",
            &["Diseño único", "Protección flexible", "Grip mejorado"],
        ),
        (
            "Funda Biodegradable Eco",
            "Phone 16",
            "Bioplástico",
            "Verde",
            399,
            "Funda ecológica 100% biodegradable",
            25,
            "Pela Case",
            &["100% compostable", "Ecológica", "Sin plástico"],
        ),
        (
            "Funda Gaming RGB",
            "Phone 16 Pro Max",
            "TPU + Metal",
            "Negro/RGB",
            799,
            "Funda gaming con luces LED RGB personalizables",
            20,
            "Razer",
            &["Luces RGB", "Gatillos gaming", "Ventilación mejorada", "App de control"],
        ),
    ];

    rows.into_iter()
        .map(
            |(name, model, material, color, price, description, stock, brand, features)| CaseDraft {
                name: name.to_string(),
                phone_model: model.to_string(),
                material: text(material),
                color: text(color),
                price: Some(Decimal::new(price * 100, 2)),
                image_url: None,
                description: text(description),
                stock: Some(stock),
                brand: text(brand),
                features: owned(features),
            },
        )
        .collect()
}

/// Ten mailing-list entries; one unsubscribed.
#[must_use]
#[allow(clippy::type_complexity)]
pub fn mails() -> Vec<MailDraft> {
    // email, first, last, phone, source, tags, notes, subscribed
    let rows: [(&str, &str, &str, Option<&str>, &str, &[&str], Option<&str>, bool); 10] = [
        ("juan.perez@gmail.com", "Juan", "Pérez", Some("+52 55 1234 5678"), "newsletter", &["cliente-activo", "premium"], Some("Cliente frecuente, compra tech"), true),
        ("maria.garcia@hotmail.com", "María", "García", Some("+52 33 9876 5432"), "checkout", &["nueva-cliente"], Some("Primera compra en diciembre"), true),
        ("carlos.martinez@yahoo.com", "Carlos", "Martínez", None, "newsletter", &["suscriptor"], None, true),
        ("ana.lopez@outlook.com", "Ana", "López", Some("+52 81 5555 1234"), "manual", &["vip", "recomendado"], Some("Contacto de evento empresarial"), true),
        ("pedro.sanchez@gmail.com", "Pedro", "Sánchez", None, "newsletter", &["interesado"], None, true),
        ("laura.rodriguez@gmail.com", "Laura", "Rodríguez", Some("+52 55 7777 8888"), "checkout", &["cliente-activo"], Some("Le gustan los productos de audio"), true),
        ("miguel.torres@hotmail.com", "Miguel", "Torres", None, "newsletter", &["no-suscrito"], Some("Canceló suscripción en enero"), false),
        ("sofia.ramirez@gmail.com", "Sofía", "Ramírez", Some("+52 442 123 4567"), "checkout", &["nueva-cliente", "potencial-vip"], Some("Hizo compra grande ($3000 MXN)"), true),
        ("diego.hernandez@yahoo.com", "Diego", "Hernández", None, "manual", &["prospecto"], Some("Contacto de LinkedIn"), true),
        ("valeria.morales@outlook.com", "Valeria", "Morales", Some("+52 222 999 8888"), "newsletter", &["suscriptor", "activo"], Some("Abre todos los emails"), true),
    ];

    rows.into_iter()
        .map(
            |(email, first, last, phone, source, tags, notes, subscribed)| MailDraft {
                email: email.to_string(),
                first_name: text(first),
                last_name: text(last),
                phone: phone.map(ToString::to_string),
                // Only the exception is sent; the column default covers the rest.
                subscribed: (!subscribed).then_some(false),
                source: text(source),
                tags: owned(tags),
                notes: notes.map(ToString::to_string),
            },
        )
        .collect()
}

/// Twelve user profiles across Mexican cities; eight subscribed.
#[must_use]
#[allow(clippy::type_complexity)]
pub fn users() -> Vec<UserDraft> {
    // email, first, last, phone, address, city, postal code, (y, m, d), newsletter
    let rows: [(&str, &str, &str, &str, &str, &str, &str, (i32, u32, u32), bool); 12] = [
        ("maria.gonzalez@gmail.com", "María", "González", "+52 55 1234 5678", "Av. Insurgentes Sur 1234", "Ciudad de México", "03100", (1990, 5, 15), true),
        ("carlos.rodriguez@hotmail.com", "Carlos", "Rodríguez", "+52 33 9876 5432", "Calle Juárez 456", "Guadalajara", "44100", (1985, 8, 22), true),
        ("ana.martinez@yahoo.com", "Ana", "Martínez", "+52 81 5555 1234", "Av. Constitución 789", "Monterrey", "64000", (1992, 3, 10), false),
        ("luis.hernandez@outlook.com", "Luis", "Hernández", "+52 222 444 7777", "Blvd. 5 de Mayo 321", "Puebla", "72000", (1988, 11, 30), true),
        ("sofia.lopez@gmail.com", "Sofía", "López", "+52 998 333 6666", "Av. Tulum 654", "Cancún", "77500", (1995, 7, 18), true),
        ("pedro.sanchez@gmail.com", "Pedro", "Sánchez", "+52 442 888 9999", "Calle Corregidora 234", "Querétaro", "76000", (1987, 2, 25), false),
        ("laura.ramirez@hotmail.com", "Laura", "Ramírez", "+52 664 777 5555", "Av. Revolución 876", "Tijuana", "22000", (1993, 9, 12), true),
        ("diego.torres@yahoo.com", "Diego", "Torres", "+52 656 222 3333", "Calle Tecnológico 543", "Ciudad Juárez", "32000", (1991, 4, 8), false),
        ("valeria.flores@gmail.com", "Valeria", "Flores", "+52 667 111 2222", "Av. Obregón 987", "Culiacán", "80000", (1994, 12, 20), true),
        ("miguel.morales@outlook.com", "Miguel", "Morales", "+52 999 444 5555", "Calle 60 #456", "Mérida", "97000", (1989, 6, 14), true),
        ("fernanda.ruiz@gmail.com", "Fernanda", "Ruiz", "+52 614 666 7777", "Av. Universidad 321", "Chihuahua", "31000", (1996, 1, 5), false),
        ("roberto.jimenez@hotmail.com", "Roberto", "Jiménez", "+52 844 888 9999", "Blvd. Venustiano Carranza 654", "Saltillo", "25000", (1986, 10, 28), true),
    ];

    rows.into_iter()
        .map(
            |(email, first, last, phone, address, city, postal, (y, m, d), newsletter)| UserDraft {
                email: email.to_string(),
                first_name: first.to_string(),
                last_name: last.to_string(),
                phone: text(phone),
                address: text(address),
                city: text(city),
                country: text("México"),
                postal_code: text(postal),
                date_of_birth: NaiveDate::from_ymd_opt(y, m, d),
                newsletter_subscribed: Some(newsletter),
            },
        )
        .collect()
}

/// Five tracking sessions; two anonymous.
#[must_use]
pub fn tracking() -> Vec<TrackingDraft> {
    #[allow(clippy::too_many_arguments)]
    fn session(
        session_id: &str,
        user_agent: &str,
        ip: &str,
        referrer: &str,
        pages: (&str, &str),
        visits: i32,
        device: &str,
        city: &str,
    ) -> TrackingDraft {
        TrackingDraft {
            session_id: session_id.to_string(),
            user_agent: text(user_agent),
            ip_address: text(ip),
            referrer: text(referrer),
            landing_page: text(pages.0),
            current_page: text(pages.1),
            visit_count: Some(visits),
            device_type: text(device),
            country: text("México"),
            city: text(city),
            ..TrackingDraft::default()
        }
    }

    let identify = |mut draft: TrackingDraft, email: &str, first: &str, last: &str| {
        draft.email = text(email);
        draft.first_name = text(first);
        draft.last_name = text(last);
        draft
    };

    let mut carlos = identify(
        session(
            "sess_003_carlos",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Safari/605.1.15",
            "192.168.1.102",
            "https://www.instagram.com",
            ("/productos/watch-series-11", "/carrito"),
            3,
            "desktop",
            "Monterrey",
        ),
        "carlos.mendez@outlook.com",
        "Carlos",
        "Méndez",
    );
    carlos.phone = text("+52 33 8888 9999");

    vec![
        identify(
            session(
                "sess_001_ana",
                "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X)",
                "192.168.1.100",
                "https://www.google.com",
                ("/", "/productos/phone-16"),
                5,
                "mobile",
                "Ciudad de México",
            ),
            "ana.lopez@gmail.com",
            "Ana",
            "López",
        ),
        session(
            "sess_002_anon",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0.0.0",
            "192.168.1.101",
            "https://www.facebook.com",
            ("/", "/"),
            1,
            "desktop",
            "Guadalajara",
        ),
        carlos,
        session(
            "sess_004_anon2",
            "Mozilla/5.0 (iPad; CPU OS 16_0 like Mac OS X) Safari/604.1",
            "192.168.1.103",
            "direct",
            ("/productos/pad-air", "/productos/pad-air"),
            1,
            "tablet",
            "Puebla",
        ),
        identify(
            session(
                "sess_005_sofia",
                "Mozilla/5.0 (Android 13; Mobile) Chrome/120.0.0.0",
                "192.168.1.104",
                "https://www.tiktok.com",
                ("/", "/productos/bookpro-de-14"),
                7,
                "mobile",
                "Cancún",
            ),
            "sofia.ramirez@hotmail.com",
            "Sofía",
            "Ramírez",
        ),
    ]
}
