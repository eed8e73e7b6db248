#![cfg(feature = "sqlite")]

mod adapter;
