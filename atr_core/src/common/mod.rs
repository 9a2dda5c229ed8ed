pub mod atr_exception;
