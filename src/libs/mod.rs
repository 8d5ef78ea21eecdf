pub mod cigar;
pub mod error;
pub mod exonerate;
pub mod io;
pub mod merge;
pub mod record;
pub mod sam;
pub mod select;
pub mod seq;
pub mod splice;

pub use error::StitchError;
