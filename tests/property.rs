mod property {
    mod invariants;
}
