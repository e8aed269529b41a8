mod filter;
mod load;
mod model;
mod parse;
mod sample;

pub use filter::{CardFilter, visible_cards, visible_sets};
pub use load::load_board;
pub use model::{Board, IdeaCard, IdeaSet, Project};
pub use sample::sample_board;
