// Route handlers, split by security tier:
// Public (no auth, token acquisition) → Protected (JWT required)

pub mod protected; // JWT authentication required (/api/*)
pub mod public; // No authentication required (/api/auth/*)
