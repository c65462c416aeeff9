// One module per section entity. Reads are public; writes sit behind the
// access-gate layers wired up in the router (protect -> editor_or_admin,
// settings writes protect -> admin_only).
pub mod about;
pub mod contact;
pub mod gallery;
pub mod hero;
pub mod pricing;
pub mod settings;
pub mod testimonials;
pub mod trainers;
pub mod training;
