use super::*;

fn raw_text(value: &str) -> Option<RawValue> {
    Some(RawValue::Text(value.to_owned()))
}

fn full_raw() -> RawVehicleData {
    RawVehicleData {
        year: raw_text("2023"),
        make: Some("  HONDA ".to_owned()),
        model: Some("civic".to_owned()),
        trim: Some(" LX ".to_owned()),
        body_style: Some("4dr Sedan".to_owned()),
        price: raw_text("$25,999"),
        mileage: raw_text("15,234 miles"),
        exterior_color: Some("sonic GRAY pearl".to_owned()),
        interior_color: Some("black".to_owned()),
        transmission: Some("CVT Automatic".to_owned()),
        drivetrain: Some("front wheel drive".to_owned()),
        engine: Some(" 2.0L  I4 ".to_owned()),
        fuel_type: Some("Gas".to_owned()),
        vin: Some("1hgcv-1f34-la000001".to_owned()),
        stock_number: Some("Stock #: A1234".to_owned()),
        description: Some(
            "One owner,  clean history. Financing available for all credit types! Call us today."
                .to_owned(),
        ),
        condition: Some("Certified Pre-Owned".to_owned()),
    }
}

// -----------------------------------------------------------------------
// Scalars
// -----------------------------------------------------------------------

#[test]
fn title_case_lowercases_then_capitalizes_words() {
    assert_eq!(title_case("sonic GRAY pearl"), "Sonic Gray Pearl");
    assert_eq!(title_case("mercedes-benz"), "Mercedes-Benz");
    assert_eq!(title_case("f-150"), "F-150");
}

#[test]
fn parse_integer_strips_currency_and_units() {
    assert_eq!(parse_integer(&RawValue::Text("$25,999".to_owned())), Some(25_999));
    assert_eq!(parse_integer(&RawValue::Text("15,234 miles".to_owned())), Some(15_234));
    assert_eq!(parse_integer(&RawValue::Text("$ 1 999.50".to_owned())), Some(1_999));
    assert_eq!(parse_integer(&RawValue::Number(42)), Some(42));
    assert_eq!(parse_integer(&RawValue::Text("-5".to_owned())), Some(-5));
}

#[test]
fn parse_integer_rejects_non_numeric() {
    assert_eq!(parse_integer(&RawValue::Text("not-a-number".to_owned())), None);
    assert_eq!(parse_integer(&RawValue::Text(String::new())), None);
    assert_eq!(parse_integer(&RawValue::Text("Call for price".to_owned())), None);
}

#[test]
fn vin_strips_separators_and_uppercases() {
    assert_eq!(
        normalize_vin("1hgcv-1f34 la000001").as_deref(),
        Some("1HGCV1F34LA000001")
    );
}

#[test]
fn vin_of_wrong_length_is_absent() {
    assert_eq!(normalize_vin("1HGCV1F34LA00000"), None);
    assert_eq!(normalize_vin("1HGCV1F34LA0000012"), None);
    // I, O and Q are dropped, leaving 16 characters.
    assert_eq!(normalize_vin("1HGCV1F34LA00000O"), None);
}

#[test]
fn drivetrain_mapping() {
    assert_eq!(normalize_drivetrain("front wheel drive").as_deref(), Some("FWD"));
    assert_eq!(normalize_drivetrain("4x4").as_deref(), Some("4WD"));
    assert_eq!(normalize_drivetrain("All Wheel Drive").as_deref(), Some("AWD"));
    assert_eq!(normalize_drivetrain("RWD").as_deref(), Some("RWD"));
}

#[test]
fn transmission_checks_cvt_before_automatic() {
    assert_eq!(normalize_transmission("CVT Automatic").as_deref(), Some("CVT"));
    assert_eq!(normalize_transmission("8-Speed A/T").as_deref(), Some("Automatic"));
    assert_eq!(normalize_transmission("6 speed manual").as_deref(), Some("Manual"));
    assert_eq!(normalize_transmission("dual clutch").as_deref(), Some("Dual Clutch"));
}

#[test]
fn fuel_and_body_style_mapping() {
    assert_eq!(normalize_fuel_type("Plug-In Hybrid").as_deref(), Some("Plug-in Hybrid"));
    assert_eq!(normalize_fuel_type("Gas/Electric Hybrid").as_deref(), Some("Hybrid"));
    assert_eq!(normalize_fuel_type("Gasoline").as_deref(), Some("Gasoline"));
    assert_eq!(normalize_body_style("Sport Utility").as_deref(), Some("SUV"));
    assert_eq!(normalize_body_style("Crew Cab Pickup").as_deref(), Some("Truck"));
    assert_eq!(normalize_body_style("Minivan").as_deref(), Some("Minivan"));
    assert_eq!(normalize_body_style("cargo van").as_deref(), Some("Van"));
}

#[test]
fn condition_mapping() {
    assert_eq!(normalize_condition(None), Condition::Used);
    assert_eq!(normalize_condition(Some("NEW")), Condition::New);
    assert_eq!(normalize_condition(Some("Certified")), Condition::CertifiedPreOwned);
    assert_eq!(normalize_condition(Some("Pre-Owned")), Condition::Used);
    assert_eq!(normalize_condition(Some("renewed")), Condition::Used);
}

#[test]
fn description_strips_boilerplate_and_adds_period() {
    let cleaned = clean_description(
        "Great   commuter. Financing available on approval! Visit us at www.example.com today. Runs well",
    );
    assert_eq!(cleaned.as_deref(), Some("Great commuter. Runs well."));
}

#[test]
fn description_of_only_boilerplate_is_absent() {
    assert_eq!(clean_description("Call us now! Trade-ins welcome."), None);
    assert_eq!(clean_description("   "), None);
}

// -----------------------------------------------------------------------
// normalize_vehicle_data
// -----------------------------------------------------------------------

#[test]
fn normalize_vehicle_data_maps_every_field() {
    let vehicle = normalize_vehicle_data(&full_raw());
    assert_eq!(vehicle.year, Some(2023));
    assert_eq!(vehicle.make.as_deref(), Some("Honda"));
    assert_eq!(vehicle.model.as_deref(), Some("Civic"));
    assert_eq!(vehicle.trim.as_deref(), Some("LX"));
    assert_eq!(vehicle.body_style.as_deref(), Some("Sedan"));
    assert_eq!(vehicle.price, Some(25_999));
    assert_eq!(vehicle.mileage, Some(15_234));
    assert_eq!(vehicle.exterior_color.as_deref(), Some("Sonic Gray Pearl"));
    assert_eq!(vehicle.transmission.as_deref(), Some("CVT"));
    assert_eq!(vehicle.drivetrain.as_deref(), Some("FWD"));
    assert_eq!(vehicle.engine.as_deref(), Some("2.0L I4"));
    assert_eq!(vehicle.fuel_type.as_deref(), Some("Gasoline"));
    assert_eq!(vehicle.vin.as_deref(), Some("1HGCV1F34LA000001"));
    assert_eq!(vehicle.stock_number.as_deref(), Some("A1234"));
    assert_eq!(
        vehicle.description.as_deref(),
        Some("One owner, clean history.")
    );
    assert_eq!(vehicle.condition, Condition::CertifiedPreOwned);
}

#[test]
fn normalize_vehicle_data_drops_unparsable_numbers() {
    let raw = RawVehicleData {
        price: raw_text("not-a-number"),
        mileage: raw_text("-10"),
        year: raw_text("unknown"),
        ..RawVehicleData::default()
    };
    let vehicle = normalize_vehicle_data(&raw);
    assert_eq!(vehicle.price, None);
    assert_eq!(vehicle.mileage, None);
    assert_eq!(vehicle.year, None);
}

#[test]
fn normalize_vehicle_data_of_empty_input_is_empty() {
    let vehicle = normalize_vehicle_data(&RawVehicleData::default());
    assert_eq!(vehicle, Vehicle::default());
}

#[test]
fn normalize_vehicle_data_is_idempotent() {
    let samples = [
        full_raw(),
        RawVehicleData::default(),
        RawVehicleData {
            make: Some("BMW".to_owned()),
            body_style: Some("Roadster".to_owned()),
            transmission: Some("Dual-Clutch".to_owned()),
            description: Some("Visit us online for more. Clean".to_owned()),
            condition: Some("new".to_owned()),
            ..RawVehicleData::default()
        },
    ];
    for raw in samples {
        let once = normalize_vehicle_data(&raw);
        let twice = normalize_vehicle_data(&RawVehicleData::from(&once));
        assert_eq!(once, twice);
    }
}

// -----------------------------------------------------------------------
// Dealer and formatting
// -----------------------------------------------------------------------

#[test]
fn normalize_dealer_formats_phone_state_and_zip() {
    let dealer = normalize_dealer(&Dealer {
        name: Some("  Metro   Honda ".to_owned()),
        phone: Some("1-555-123-4567".to_owned()),
        city: Some("Austin".to_owned()),
        state: Some("tx".to_owned()),
        zip: Some("TX 78701-1234".to_owned()),
    });
    assert_eq!(dealer.name.as_deref(), Some("Metro Honda"));
    assert_eq!(dealer.phone.as_deref(), Some("(555) 123-4567"));
    assert_eq!(dealer.state.as_deref(), Some("TX"));
    assert_eq!(dealer.zip.as_deref(), Some("78701-1234"));
    assert_eq!(normalize_dealer(&dealer), dealer);
}

#[test]
fn normalize_dealer_keeps_unrecognized_phone_and_drops_bad_state() {
    let dealer = normalize_dealer(&Dealer {
        phone: Some("ext. 42".to_owned()),
        state: Some("Texas".to_owned()),
        ..Dealer::default()
    });
    assert_eq!(dealer.phone.as_deref(), Some("ext. 42"));
    assert_eq!(dealer.state, None);
}

#[test]
fn price_and_mileage_formatting() {
    assert_eq!(format_price(25_999), "$25,999");
    assert_eq!(format_price(999), "$999");
    assert_eq!(format_price(1_000_000), "$1,000,000");
    assert_eq!(format_mileage(15_234), "15,234 miles");
    assert_eq!(format_mileage(1), "1 miles");
}

// -----------------------------------------------------------------------
// Marketplace text
// -----------------------------------------------------------------------

#[test]
fn facebook_title_joins_present_fields() {
    let vehicle = Vehicle {
        year: Some(2023),
        make: Some("Honda".to_owned()),
        model: Some("Civic".to_owned()),
        trim: Some("LX".to_owned()),
        ..Vehicle::default()
    };
    assert_eq!(generate_facebook_title(&vehicle), "2023 Honda Civic LX");
    assert_eq!(generate_facebook_title(&Vehicle::default()), "");

    let partial = Vehicle {
        make: Some("Ford".to_owned()),
        model: Some("F-150".to_owned()),
        ..Vehicle::default()
    };
    assert_eq!(generate_facebook_title(&partial), "Ford F-150");
}

#[test]
fn facebook_description_has_all_sections_in_order() {
    let vehicle = normalize_vehicle_data(&full_raw());
    let dealer = Dealer {
        name: Some("Metro Honda".to_owned()),
        phone: Some("(555) 123-4567".to_owned()),
        ..Dealer::default()
    };
    let text = generate_facebook_description(&vehicle, &dealer, None);
    let expected = "VEHICLE DETAILS:\n\
        • Year: 2023\n\
        • Make: Honda\n\
        • Model: Civic\n\
        • Trim: LX\n\
        • Mileage: 15,234 miles\n\
        • Exterior: Sonic Gray Pearl\n\
        • Interior: Black\n\
        • Transmission: CVT\n\
        • Drivetrain: FWD\n\
        • Engine: 2.0L I4\n\
        • Fuel: Gasoline\n\
        • VIN: 1HGCV1F34LA000001\n\
        • Stock #: A1234\n\
        \n\
        DESCRIPTION:\n\
        One owner, clean history.\n\
        \n\
        Offered by: Metro Honda\n\
        Contact: (555) 123-4567";
    assert_eq!(text, expected);
}

#[test]
fn facebook_description_omits_empty_sections() {
    let vehicle = Vehicle {
        make: Some("Toyota".to_owned()),
        ..Vehicle::default()
    };
    let text = generate_facebook_description(&vehicle, &Dealer::default(), Some("T-9"));
    assert_eq!(text, "VEHICLE DETAILS:\n• Make: Toyota\n• Stock #: T-9");
    assert!(!text.contains("DESCRIPTION:"));
    assert!(!text.contains("Offered by"));

    assert_eq!(
        generate_facebook_description(&Vehicle::default(), &Dealer::default(), None),
        ""
    );
}
