mod common;

mod classification;
mod routing;
