mod bidding;
mod scarcity;
mod session;
