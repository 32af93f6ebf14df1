pub mod deposit;
pub mod load;
