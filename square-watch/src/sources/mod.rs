pub mod binance_square;

pub use binance_square::BinanceSquare;
