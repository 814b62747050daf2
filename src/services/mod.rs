pub mod email;
pub mod otp;
pub mod signup;
pub mod sms;
