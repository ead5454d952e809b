//! Name pools for student and guardian generation.

pub const FIRST_NAMES: &[&str] = &[
    "Aadhav", "Aadhya", "Aahan", "Aarav", "Aarya", "Aasha", "Aashvi", "Abhay", "Abhinav",
    "Abhishek", "Adarsh", "Aditi", "Aditya", "Advika", "Ahana", "Aisha", "Ajay", "Akash",
    "Akshara", "Akshay", "Alok", "Aman", "Amar", "Amit", "Amita", "Amrita", "Anand", "Ananya",
    "Anil", "Anita", "Anjali", "Ankit", "Ankita", "Ansh", "Anurag", "Anushka", "Aparna",
    "Archana", "Arjun", "Arnav", "Arohi", "Arun", "Aryan", "Asha", "Ashish", "Ashok", "Ashwin",
    "Atharv", "Atul", "Avani", "Avinash", "Ayaan", "Ayesha", "Ayush", "Bharat", "Bhavana",
    "Bhavesh", "Bhavya", "Chandan", "Chetan", "Chirag", "Daksh", "Darshan", "Deepa", "Deepak",
    "Deepika", "Dev", "Devika", "Dhruv", "Diya", "Divya", "Ekta", "Esha", "Farhan", "Fatima",
    "Gaurav", "Gayatri", "Geeta", "Gopal", "Govind", "Gunjan", "Hardik", "Harish", "Harsha",
    "Hemant", "Hitesh", "Indira", "Ira", "Irfan", "Isha", "Ishaan", "Ishita", "Jai", "Janvi",
    "Jatin", "Jaya", "Jayesh", "Jyoti", "Kabir", "Kajal", "Kamal", "Kapil", "Karan", "Kartik",
    "Kavya", "Keshav", "Ketan", "Khushi", "Kiran", "Kirti", "Komal", "Krishna", "Kriti", "Kunal",
    "Lakshmi", "Lalit", "Lavanya", "Madhav", "Madhavi", "Mahesh", "Manas", "Manav", "Manish",
    "Mansi", "Maya", "Mayank", "Meera", "Mehul", "Milan", "Mohan", "Mukesh", "Naina", "Nandini",
    "Naresh", "Neha", "Nidhi", "Nikhil", "Nikita", "Nisha", "Nishant", "Nitin", "Om", "Palak",
    "Pallavi", "Paras", "Parth", "Pavan", "Payal", "Pooja", "Poonam", "Prachi", "Prakash",
    "Pranav", "Prashant", "Pratik", "Priya", "Priyanka", "Radha", "Radhika", "Rahul", "Raj",
    "Rajat", "Rajesh", "Rakesh", "Ram", "Ramesh", "Ravi", "Rekha", "Rishi", "Ritu", "Rohan",
    "Rohit", "Rudra", "Saanvi", "Sachin", "Sahil", "Sakshi", "Samir", "Sandeep", "Sanjay",
    "Sarika", "Sarthak", "Satish", "Saurabh", "Seema", "Shalini", "Shantanu", "Sharad",
    "Shashank", "Shilpa", "Shiv", "Shivam", "Shivani", "Shreya", "Shubham", "Siddharth",
    "Simran", "Sneha", "Soham", "Sonam", "Sonia", "Srishti", "Sudhir", "Suhani", "Sumit",
    "Sunil", "Sunita", "Suresh", "Surya", "Swati", "Tanvi", "Tarun", "Tejas", "Tushar", "Uday",
    "Ujjwal", "Uma", "Umesh", "Urvashi", "Vaibhav", "Varun", "Vedant", "Veer", "Vidya", "Vijay",
    "Vikas", "Vikram", "Vinay", "Vinod", "Vishal", "Vishnu",
];

pub const LAST_NAMES: &[&str] = &[
    "Agarwal", "Agnihotri", "Ahuja", "Anand", "Arora", "Bajaj", "Bansal", "Banerjee", "Basu",
    "Bhandari", "Bharadwaj", "Bhatia", "Bhatt", "Bhattacharya", "Biswas", "Bose", "Chakraborty",
    "Chandra", "Chatterjee", "Chaturvedi", "Chauhan", "Chawla", "Chopra", "Choudhary",
    "Chowdhury", "Das", "Datta", "Desai", "Deshpande", "Dixit", "Dubey", "Dutta", "Dwivedi",
    "Gandhi", "Garg", "Ghosh", "Goel", "Goswami", "Goyal", "Grover", "Gupta", "Hegde", "Iyer",
    "Jadhav", "Jain", "Jaiswal", "Jha", "Jindal", "Joshi", "Kadam", "Kapoor", "Kashyap", "Kaul",
    "Kaushik", "Khan", "Khanna", "Khatri", "Kohli", "Kothari", "Krishnan", "Kulkarni", "Kumar",
    "Lal", "Mahajan", "Maheshwari", "Malhotra", "Malik", "Mathur", "Mehta", "Menon", "Mishra",
    "Mittal", "Modi", "Mukherjee", "Murthy", "Nag", "Naik", "Nair", "Narang", "Nayak", "Ojha",
    "Pal", "Pandey", "Pandit", "Parekh", "Parmar", "Patel", "Pathak", "Patil", "Pawar", "Pillai",
    "Prabhu", "Pradhan", "Prasad", "Purohit", "Qureshi", "Rai", "Rajan", "Raman", "Rao",
    "Rathore", "Raut", "Rawat", "Reddy", "Roy", "Saini", "Sarkar", "Saxena", "Sen", "Sengupta",
    "Sethi", "Shah", "Sharma", "Shastri", "Shenoy", "Shinde", "Shukla", "Singh", "Singhal",
    "Sinha", "Sood", "Srinivasan", "Subramanian", "Tandon", "Thakur", "Tiwari", "Tomar",
    "Tripathi", "Trivedi", "Tyagi", "Vaidya", "Varma", "Verma", "Vohra", "Vyas", "Wagh", "Yadav",
];
