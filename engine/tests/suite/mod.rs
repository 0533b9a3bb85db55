mod persistence;
mod session_flow;
