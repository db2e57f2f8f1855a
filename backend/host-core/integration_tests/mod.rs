mod bridge_ws;
mod collaborators;
mod ipc_tests;
