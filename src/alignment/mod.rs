pub mod bleu;
pub mod combine;
pub mod gale_church;
pub mod gap_filler;
pub mod normalize;
pub mod path_finder;
