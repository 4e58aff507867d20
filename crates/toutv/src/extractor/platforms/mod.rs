pub mod toutv;
