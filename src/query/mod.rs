//! Remote query collaborator

mod client;

pub use client::{AnswerService, HttpAnswerService, QueryError, QueryRequest, APOLOGY};
