pub mod pileup;
pub mod refnames;
