mod es;
mod spea2_tournament;

pub use es::EsSelector;
pub use spea2_tournament::Spea2TournamentSelector;
