//! CSV replay: scripted order commands in, final order table out.

pub mod command_reader;
pub mod order_writer;
pub mod replay;
