pub mod grounding_session;
