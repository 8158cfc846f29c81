fn main() {
    uniffi::generate_scaffolding("src/twilio_video.udl").unwrap();
}
