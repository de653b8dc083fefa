use serde::Serialize;

/// A purchasable credit package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub name: &'static str,
    /// Credits added to the balance on a settled payment, bonus included.
    pub credits: i64,
    /// Price in Indonesian rupiah.
    pub price_idr: u64,
}

/// The credit packages offered in the pricing dialog.
pub const PLANS: [Plan; 3] = [
    Plan { name: "UMKM", credits: 25, price_idr: 29_000 },
    Plan { name: "Toko", credits: 160, price_idr: 119_000 },
    Plan { name: "Mall", credits: 530, price_idr: 349_000 },
];

/// Look up a plan by name, case-insensitively.
pub fn find_plan(name: &str) -> Option<&'static Plan> {
    PLANS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
