/// Backend primary keys are integer row ids.
pub type EntityId = i64;

/// Player money, as the backend reports it.
pub type Money = f64;

/// Fallback month names when a snapshot carries a short `months` list.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
