/// (name, slug) in navigation order.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("Dorm & Room", "dorm-and-room"),
    ("Electronics", "electronics"),
    ("Books", "books"),
    ("Clothing", "clothing"),
    ("Kitchen", "kitchen"),
    ("Transport", "transport"),
    ("Hobbies", "hobbies"),
];

pub const DEMO_SELLER_USERNAME: &str = "daniel";
pub const DEMO_SELLER_EMAIL: &str = "daniel@example.com";
pub const DEMO_SELLER_DISPLAY_NAME: &str = "Daniel Baadom";
/// Not a valid PHC string, so no password ever verifies against it.
pub const UNUSABLE_PASSWORD_HASH: &str = "seed_hash_not_for_login";

pub struct DemoListing {
    pub title: &'static str,
    pub description: &'static str,
    pub price_cents: i64,
    pub condition: &'static str,
    pub color: &'static str,
    pub category: &'static str,
}

const fn demo(
    title: &'static str,
    description: &'static str,
    price_cents: i64,
    condition: &'static str,
    color: &'static str,
    category: &'static str,
) -> DemoListing {
    DemoListing {
        title,
        description,
        price_cents,
        condition,
        color,
        category,
    }
}

pub const DEMO_LISTINGS: &[DemoListing] = &[
    demo("Dorm Desk Lamp", "Bright LED lamp for late-night study", 1200, "Good", "Black", "Dorm & Room"),
    demo("Memory Foam Pillow", "Comfort pillow, clean and fresh", 1450, "Like New", "White", "Dorm & Room"),
    demo("Twin XL Sheet Set", "Soft sheets for dorm bed", 1800, "Good", "Gray", "Dorm & Room"),
    demo("Over-the-Door Hooks", "Hooks for towels, bags, coats", 600, "New", "Silver", "Dorm & Room"),
    demo("Dry Erase Marker Set", "Assorted markers (set)", 500, "New", "Mixed", "Dorm & Room"),
    demo("Clip-On Fan", "Quiet fan for dorm bed/desk", 1500, "Good", "White", "Dorm & Room"),
    demo("Wireless Earbuds", "Clear sound, good battery", 2500, "Good", "Black", "Electronics"),
    demo("Power Bank 10000mAh", "Portable charger, reliable", 1800, "Good", "Black", "Electronics"),
    demo("USB-C Cable 6ft", "Long cable, durable", 700, "New", "Black", "Electronics"),
    demo("Mechanical Keyboard", "Clicky keys, great feel", 4500, "Like New", "Black", "Electronics"),
    demo("Screen Cleaning Kit", "Spray + cloth set", 500, "New", "Mixed", "Electronics"),
    demo("Webcam 1080p", "Good for zoom classes", 2800, "Good", "Black", "Electronics"),
    demo("Calculus Textbook", "Good for Calc I/II", 3500, "Good", "Mixed", "Books"),
    demo("Programming Handbook", "Beginner-friendly coding guide", 2000, "Like New", "Mixed", "Books"),
    demo("Lab Manual", "Lab manual, minimal writing", 900, "Good", "Mixed", "Books"),
    demo("Sticky Notes Pack", "Sticky notes (multi colors)", 450, "New", "Mixed", "Books"),
    demo("Index Cards Pack", "100 count index cards", 400, "New", "Mixed", "Books"),
    demo("Iliad Copy", "Paperback copy of The Iliad", 1000, "Good", "Mixed", "Books"),
    demo("Black Hoodie", "Warm hoodie, clean", 1800, "Good", "Black", "Clothing"),
    demo("Jeans", "Good jeans, fits well", 2000, "Good", "Blue", "Clothing"),
    demo("Socks Pack", "Pack of socks", 700, "New", "Mixed", "Clothing"),
    demo("Tie", "Formal tie", 600, "Good", "Black", "Clothing"),
    demo("Beanie", "Warm beanie", 750, "Good", "Black", "Clothing"),
    demo("Sneakers", "Everyday sneakers", 3500, "Good", "White", "Clothing"),
    demo("Electric Kettle", "Boils fast, clean inside", 1800, "Good", "Black", "Kitchen"),
    demo("Mug Set", "Set of 2 mugs", 900, "Good", "Mixed", "Kitchen"),
    demo("Coffee Maker", "Small coffee maker", 2500, "Good", "Black", "Kitchen"),
    demo("Sponge Pack", "Pack of sponges", 400, "New", "Mixed", "Kitchen"),
    demo("Can Opener", "Works smoothly", 500, "Good", "Black", "Kitchen"),
    demo("Pot", "Medium pot, good condition", 1600, "Good", "Silver", "Kitchen"),
    demo("Bike Helmet", "Safe helmet, adjustable", 2000, "Good", "Black", "Transport"),
    demo("Bike Lock", "Strong lock", 1200, "Good", "Black", "Transport"),
    demo("Reflective Vest", "High visibility vest", 800, "New", "Yellow", "Transport"),
    demo("Skateboard", "Smooth wheels, good deck", 3500, "Good", "Black", "Transport"),
    demo("Bike Bell", "Loud bell", 500, "New", "Black", "Transport"),
    demo("Umbrella", "Compact umbrella", 850, "Good", "Black", "Transport"),
];
