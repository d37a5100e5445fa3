// Résumé scoring pipeline.
// Contact heuristics, skill tagging and similarity scoring are leaf services;
// the ranker drives them per document and owns the transient storage.

pub mod contact;
pub mod handlers;
pub mod ranker;
pub mod similarity;
pub mod skills;
