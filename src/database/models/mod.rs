pub mod centre;
pub mod chercheur;
pub mod province;
pub mod publication;

pub use centre::{Centre, NewCentre, UpdateCentre};
pub use chercheur::{Chercheur, NewChercheur, UpdateChercheur};
pub use province::{NewProvince, Province, UpdateProvince};
pub use publication::{NewAuteur, NewPublication, Publication, UpdatePublication};
