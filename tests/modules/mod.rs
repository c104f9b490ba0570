mod binary;
mod json;
mod reader;
mod round_trip;
