#![allow(non_snake_case)]

pub mod Category;
pub mod Comment;
pub mod Downvote;
pub mod Ticket;
pub mod TicketStatusHistory;
pub mod UpgradeRequest;
pub mod Upvote;
pub mod User;
